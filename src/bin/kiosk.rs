use anyhow::Result;
use env_logger::Env;
use std::io::{self, Write};

use spinwin_backend::kiosk::{FlowState, KioskApi, SessionStore};

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// 摊位终端: 校验 -> 抽奖 -> 领取 的交互式流程。
/// 校验成功后把二维码写入本地会话文件, 重启后重新 verify 恢复到正确的步骤。
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let base_url = std::env::var("SPINWIN_API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let api = KioskApi::new(&base_url);
    let store = SessionStore::new(".kiosk-session");

    let mut state = FlowState::new();
    let mut current: Option<String> = store.load()?;

    println!("=== LOOK LOOK Spin & Win ===");
    println!("One spin per visitor. Prizes subject to availability.");

    // 展示当前转盘扇区
    match api.prizes().await {
        Ok(list) => {
            let names: Vec<String> = list.into_iter().map(|p| p.name).collect();
            println!("Today's wheel: {}", names.join(" | "));
        }
        Err(e) => log::warn!("Failed to load prize list: {e}"),
    }

    // 本地会话恢复: 重新校验并跳到对应的步骤
    if let Some(code) = current.clone() {
        println!("Resuming session for code {code} ...");
        match api.verify(&code).await {
            Ok(resp) => {
                println!("{}", resp.message);
                state = state.after_verify(&resp);
            }
            Err(e) => println!("Verification failed: {e}"),
        }
    }

    loop {
        match state.clone() {
            FlowState::Verifying => {
                let input = prompt("Scan or enter your QR code (or 'quit'): ")?;
                if input.eq_ignore_ascii_case("quit") {
                    break;
                }
                if input.is_empty() {
                    continue;
                }
                match api.verify(&input).await {
                    Ok(resp) => {
                        println!("{}", resp.message);
                        if resp.valid && (resp.eligible || resp.claimed) {
                            store.save(&input)?;
                            current = Some(input);
                        }
                        state = state.after_verify(&resp);
                    }
                    // 请求失败不迁移状态, 下一轮直接重试
                    Err(e) => println!("Verification failed: {e}"),
                }
            }
            FlowState::Spinning => {
                let code = current.clone().unwrap_or_default();
                let input = prompt("Press Enter to spin the wheel (or 'reset'): ")?;
                if input.eq_ignore_ascii_case("reset") {
                    store.clear()?;
                    current = None;
                    state = state.reset();
                    continue;
                }
                match api.spin(&code).await {
                    Ok(resp) => {
                        println!("Congratulations! You won: {}", resp.prize);
                        state = state.after_spin(resp.prize);
                    }
                    // 超时等不确定失败时服务端可能已完成分配,
                    // 不能假定失败; reset 后重新 verify 即可恢复
                    Err(e) => println!("Spin failed: {e}"),
                }
            }
            FlowState::Claiming { prize } => {
                let code = current.clone().unwrap_or_default();
                match api.claim(&code).await {
                    Ok(resp) => {
                        let name = prize.unwrap_or(resp.prize);
                        println!("Your reward: {name}");
                        println!("Please see our staff to receive your prize.");
                        let _ = prompt("Press Enter to start over: ")?;
                        store.clear()?;
                        current = None;
                        state = state.reset();
                    }
                    Err(e) => {
                        println!("Claim failed: {e}");
                        let input = prompt("Press Enter to retry, or type 'reset': ")?;
                        if input.eq_ignore_ascii_case("reset") {
                            store.clear()?;
                            current = None;
                            state = state.reset();
                        }
                    }
                }
            }
            FlowState::Ineligible { reason } => {
                println!("Sorry! {reason}");
                let _ = prompt("Press Enter to start over: ")?;
                store.clear()?;
                current = None;
                state = state.reset();
            }
        }
    }

    Ok(())
}
