use std::fs;
use std::io;
use std::path::PathBuf;

/// 摊位机器的本地会话持久化。
///
/// 校验成功后记录当前二维码, reset 时清除; 机器重启或页面刷新后凭此恢复流程
/// (重新 verify 一次即可回到正确的步骤, 不会让访客从头再来)。
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取当前会话的二维码; 文件不存在或内容为空时返回 None
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                Ok((!trimmed.is_empty()).then_some(trimmed))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, qr_code: &str) -> io::Result<()> {
        fs::write(&self.path, qr_code)
    }

    /// 清除会话; 文件不存在时也视为成功
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> SessionStore {
        let path = std::env::temp_dir().join(format!(
            "spinwin-session-{}-{tag}",
            std::process::id()
        ));
        SessionStore::new(path)
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let store = temp_store("missing");
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = temp_store("roundtrip");
        store.save("LOOK001").unwrap();
        assert_eq!(store.load().unwrap(), Some("LOOK001".to_string()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = temp_store("clear");
        store.save("LOOK002").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
