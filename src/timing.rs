use derive_more::Display;

/// The two timepoints an action instance exposes: `Start`, when it begins
/// execution, and `End`, when it finishes. Durative-action conditions and
/// effects are all anchored to one of these, optionally shifted by a delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum TimepointKind {
    #[display("start")]
    Start,
    #[display("end")]
    End,
}

/// A timepoint relative to the action instance it belongs to: `kind` plus a
/// delay (e.g. `start + 2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timepoint {
    pub kind: TimepointKind,
    pub delay: i64,
}

impl Timepoint {
    pub const fn new(kind: TimepointKind, delay: i64) -> Self {
        Self { kind, delay }
    }

    pub const fn start() -> Self {
        Self::new(TimepointKind::Start, 0)
    }

    pub const fn end() -> Self {
        Self::new(TimepointKind::End, 0)
    }
}

impl std::fmt::Display for Timepoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.delay.cmp(&0) {
            std::cmp::Ordering::Less => write!(f, "{} - {}", self.kind, -self.delay),
            std::cmp::Ordering::Equal => write!(f, "{}", self.kind),
            std::cmp::Ordering::Greater => write!(f, "{} + {}", self.kind, self.delay),
        }
    }
}

/// An interval between two timepoints, with independently open/closed
/// endpoints. Used to scope durative-action conditions (`at start`,
/// `over all`, `at end`) and to describe the waitfor window during
/// robustness verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub lower: Timepoint,
    pub upper: Timepoint,
    pub is_left_open: bool,
    pub is_right_open: bool,
}

impl TimeInterval {
    pub const fn new(lower: Timepoint, upper: Timepoint, is_left_open: bool, is_right_open: bool) -> Self {
        Self {
            lower,
            upper,
            is_left_open,
            is_right_open,
        }
    }

    /// `[start, start]`: a condition or effect that applies exactly when the
    /// action starts.
    pub const fn at_start() -> Self {
        Self::new(Timepoint::start(), Timepoint::start(), false, false)
    }

    /// `[end, end]`: applies exactly when the action ends.
    pub const fn at_end() -> Self {
        Self::new(Timepoint::end(), Timepoint::end(), false, false)
    }

    /// `[start, end]`, both endpoints closed: must hold for the whole
    /// duration of the action, including its boundaries.
    pub const fn over_all() -> Self {
        Self::new(Timepoint::start(), Timepoint::end(), false, false)
    }

    pub fn contains_start(&self) -> bool {
        self.lower.kind == TimepointKind::Start && self.lower.delay <= 0 && !self.is_left_open
    }

    pub fn contains_end(&self) -> bool {
        self.upper.kind == TimepointKind::End && self.upper.delay >= 0 && !self.is_right_open
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.is_left_open { "(" } else { "[" },
            self.lower,
            self.upper,
            if self.is_right_open { ")" } else { "]" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_start_contains_only_the_start() {
        let i = TimeInterval::at_start();
        assert!(i.contains_start());
        assert!(!i.contains_end());
    }

    #[test]
    fn over_all_contains_both_endpoints() {
        let i = TimeInterval::over_all();
        assert!(i.contains_start());
        assert!(i.contains_end());
    }
}
