use crate::models::VerifyResponse;

/// 摊位客户端的三步状态机: 校验 -> 抽奖 -> 领取
///
/// 状态迁移只由服务端响应驱动; 请求失败不迁移状态 (调用方展示错误后原地重试)。
/// 服务端才是 "一人一次" 的权威判定, 本状态机只负责界面流程的顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// 等待扫码 / 校验资格
    Verifying,
    /// 校验通过, 等待转盘抽奖
    Spinning,
    /// 展示与领取奖品 (prize 为 None 表示老访客回访, 需调用 claim 取回奖品名)
    Claiming { prize: Option<String> },
    /// 不符合参与条件 (终态, 仅能 reset)
    Ineligible { reason: String },
}

impl FlowState {
    pub fn new() -> Self {
        FlowState::Verifying
    }

    /// Verify 响应驱动的迁移, 仅在 Verifying 状态生效:
    /// - valid = false -> Ineligible
    /// - eligible = true -> Spinning
    /// - 已参与且已领取 -> Claiming (再次展示奖品)
    /// - 已参与未领取 -> Ineligible
    pub fn after_verify(self, resp: &VerifyResponse) -> FlowState {
        match self {
            FlowState::Verifying => {
                if !resp.valid {
                    FlowState::Ineligible {
                        reason: resp.message.clone(),
                    }
                } else if resp.eligible {
                    FlowState::Spinning
                } else if resp.claimed {
                    FlowState::Claiming { prize: None }
                } else {
                    FlowState::Ineligible {
                        reason: resp.message.clone(),
                    }
                }
            }
            other => other,
        }
    }

    /// Spin 成功后的迁移, 仅在 Spinning 状态生效
    pub fn after_spin(self, prize: String) -> FlowState {
        match self {
            FlowState::Spinning => FlowState::Claiming { prize: Some(prize) },
            other => other,
        }
    }

    /// 回到初始状态, 丢弃全部内存状态 (不影响服务端记录)
    pub fn reset(self) -> FlowState {
        FlowState::Verifying
    }
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_resp(valid: bool, eligible: bool, claimed: bool) -> VerifyResponse {
        VerifyResponse {
            valid,
            eligible,
            claimed,
            message: "msg".to_string(),
        }
    }

    #[test]
    fn test_eligible_moves_to_spinning() {
        let state = FlowState::new().after_verify(&verify_resp(true, true, false));
        assert_eq!(state, FlowState::Spinning);
    }

    #[test]
    fn test_invalid_code_moves_to_ineligible() {
        let state = FlowState::new().after_verify(&verify_resp(false, false, false));
        assert!(matches!(state, FlowState::Ineligible { .. }));
    }

    #[test]
    fn test_already_claimed_moves_to_claiming() {
        let state = FlowState::new().after_verify(&verify_resp(true, false, true));
        assert_eq!(state, FlowState::Claiming { prize: None });
    }

    #[test]
    fn test_participated_unclaimed_is_ineligible() {
        let state = FlowState::new().after_verify(&verify_resp(true, false, false));
        assert!(matches!(state, FlowState::Ineligible { .. }));
    }

    #[test]
    fn test_spin_carries_prize_into_claiming() {
        let state = FlowState::Spinning.after_spin("10% Off".to_string());
        assert_eq!(
            state,
            FlowState::Claiming {
                prize: Some("10% Off".to_string())
            }
        );
    }

    #[test]
    fn test_transitions_only_apply_in_matching_state() {
        // Spinning 状态下的 verify 响应不迁移状态
        let state = FlowState::Spinning.after_verify(&verify_resp(false, false, false));
        assert_eq!(state, FlowState::Spinning);

        // Verifying 状态下的 spin 结果不迁移状态
        let state = FlowState::Verifying.after_spin("Pet Toy".to_string());
        assert_eq!(state, FlowState::Verifying);
    }

    #[test]
    fn test_reset_returns_to_verifying_from_any_state() {
        assert_eq!(FlowState::Spinning.reset(), FlowState::Verifying);
        assert_eq!(
            FlowState::Claiming {
                prize: Some("Pet Toy".to_string())
            }
            .reset(),
            FlowState::Verifying
        );
        assert_eq!(
            FlowState::Ineligible {
                reason: "nope".to_string()
            }
            .reset(),
            FlowState::Verifying
        );
    }
}
