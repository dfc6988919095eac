pub mod dialog;
pub mod sync;
pub mod toolbar;

use serde::{Deserialize, Serialize};

/// How the editing surface breaks long lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineWrapMode {
    NoWrap,
    #[default]
    WidgetWidth,
}

impl LineWrapMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::WidgetWidth } else { Self::NoWrap }
    }

    pub fn is_wrapping(self) -> bool {
        self == Self::WidgetWidth
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::NoWrap => Self::WidgetWidth,
            Self::WidgetWidth => Self::NoWrap,
        }
    }
}
