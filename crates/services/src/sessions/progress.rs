/// Position within a running session, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Answered share of the session, rounded down to whole percent.
    #[must_use]
    pub fn percent_complete(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.answered * 100 / self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_complete_rounds_down() {
        let progress = SessionProgress {
            total: 3,
            answered: 2,
            remaining: 1,
            is_complete: false,
        };
        assert_eq!(progress.percent_complete(), 66);
    }
}
