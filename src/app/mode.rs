use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Navigate,
    /// Typing into a text, secret or integer field
    Edit,
    /// Option popup for an enum or branch field
    Select,
    /// Tag editor of an array field
    Tags,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Navigate => write!(f, "NAVIGATE"),
            Mode::Edit => write!(f, "INSERT"),
            Mode::Select => write!(f, "SELECT"),
            Mode::Tags => write!(f, "TAGS"),
        }
    }
}
