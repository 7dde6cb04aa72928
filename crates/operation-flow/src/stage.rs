use std::fmt;

use serde::{Deserialize, Serialize};

/// Named steps of an attempt, in forward order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Init,
    EnsureContext,
    Locate,
    Bind,
    Act,
    AwaitConfirmation,
    Aggregate,
    Verify,
    Finalize,
    Continue,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Init,
        Stage::EnsureContext,
        Stage::Locate,
        Stage::Bind,
        Stage::Act,
        Stage::AwaitConfirmation,
        Stage::Aggregate,
        Stage::Verify,
        Stage::Finalize,
        Stage::Continue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "Init",
            Stage::EnsureContext => "EnsureContext",
            Stage::Locate => "Locate",
            Stage::Bind => "Bind",
            Stage::Act => "Act",
            Stage::AwaitConfirmation => "AwaitConfirmation",
            Stage::Aggregate => "Aggregate",
            Stage::Verify => "Verify",
            Stage::Finalize => "Finalize",
            Stage::Continue => "Continue",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_as_str() {
        for stage in Stage::ALL {
            let encoded = serde_json::to_value(stage).unwrap();
            assert_eq!(encoded, serde_json::Value::String(stage.as_str().into()));
        }
    }
}
