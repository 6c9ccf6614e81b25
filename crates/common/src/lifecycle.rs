//! 组合根生命周期状态

use std::fmt;

/// 组合根状态机
///
/// `Unconfigured --setup--> Ready --dispose--> Unconfigured`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// 未启动（初始状态，或已销毁）
    #[default]
    Unconfigured,
    /// 已完成启动，所有组件可用
    Ready,
}

impl ManagerState {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// 生命周期钩子阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// `on_init`
    Init,
    /// `on_finish`
    Finish,
    /// `on_dispose`
    Dispose,
}

impl HookStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Finish => "finish",
            Self::Dispose => "dispose",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_starts_unconfigured() {
        let state = ManagerState::default();
        assert_eq!(state, ManagerState::Unconfigured);
        assert!(!state.is_ready());
        assert!(ManagerState::Ready.is_ready());
    }

    #[test]
    fn hook_stage_display() {
        assert_eq!(HookStage::Finish.to_string(), "finish");
    }
}
