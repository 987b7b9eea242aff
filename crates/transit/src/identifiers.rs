//! Type-safe identifiers for trains and their scheduled runs.
//!
//! All identifiers use Arc<str> so they can be cloned freely across worker threads.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        // Derived Eq and Hash come from the string, as `Borrow` requires.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

// Train number as printed in the timetable, e.g. "12951".
impl_identifier!(TrainIdentifier);
// One concrete daily run of a train, e.g. "R03_2".
impl_identifier!(InstanceIdentifier);

impl InstanceIdentifier {
    /// Id for the `ordinal`-th run (1-based) of the route labelled `route_label`.
    ///
    /// The first run carries the bare label so single-run routes keep short ids.
    pub fn for_run(route_label: &str, ordinal: u32) -> Self {
        if ordinal <= 1 {
            Self::new(route_label)
        } else {
            Self::new(format!("{route_label}_{ordinal}"))
        }
    }
}
