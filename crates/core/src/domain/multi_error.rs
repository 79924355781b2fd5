// Multi-Error Aggregator

use crate::error::{JobError, Result};

/// Ordered collection of errors folded from several job operations
///
/// Each original error stays identifiable through [`MultiError::contains`]
/// (and therefore through [`JobError::is`] on the combined error).
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    errors: Vec<JobError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error. A combined error is flattened into this one.
    pub fn push(&mut self, err: JobError) {
        match err {
            JobError::Multiple(nested) => self.errors.extend(nested.errors),
            other => self.errors.push(other),
        }
    }

    /// Fold one outcome in; returns true if it was an error
    pub fn append(&mut self, outcome: Result<()>) -> bool {
        match outcome {
            Ok(()) => false,
            Err(err) => {
                self.push(err);
                true
            }
        }
    }

    pub fn contains(&self, target: &JobError) -> bool {
        self.errors.iter().any(|err| err.is(target))
    }

    pub fn errors(&self) -> &[JobError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when empty, the single error unchanged when there is one,
    /// `JobError::Multiple` otherwise
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(JobError::Multiple(self)),
        }
    }
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} errors occurred", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl FromIterator<JobError> for MultiError {
    fn from_iter<I: IntoIterator<Item = JobError>>(iter: I) -> Self {
        let mut errors = MultiError::new();
        for err in iter {
            errors.push(err);
        }
        errors
    }
}

/// Fold every outcome into one result without short-circuiting
pub fn combine<I>(outcomes: I) -> Result<()>
where
    I: IntoIterator<Item = Result<()>>,
{
    let mut errors = MultiError::new();
    for outcome in outcomes {
        errors.append(outcome);
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn test_all_ok_combines_to_ok() {
        assert!(combine(vec![Ok(()), Ok(())]).is_ok());
        assert!(combine(Vec::new()).is_ok());
    }

    #[test]
    fn test_single_error_is_returned_unchanged() {
        let boom = JobError::message("boom");
        let err = assert_err!(combine(vec![Ok(()), Err(boom.clone())]));

        assert!(matches!(err, JobError::Other(_)));
        assert!(err.is(&boom));
    }

    #[test]
    fn test_every_error_remains_identifiable() {
        let first = JobError::message("first");
        let second = JobError::message("second");
        let absent = JobError::message("absent");

        let err = assert_err!(combine(vec![
            Err(first.clone()),
            Ok(()),
            Err(second.clone()),
        ]));

        assert!(err.is(&first));
        assert!(err.is(&second));
        assert!(!err.is(&absent));
        assert!(err.to_string().starts_with("2 errors occurred"));
    }

    #[test]
    fn test_nested_combined_errors_are_flattened() {
        let a = JobError::message("a");
        let b = JobError::message("b");
        let c = JobError::message("c");

        let inner = assert_err!(combine(vec![Err(a.clone()), Err(b.clone())]));
        let mut outer = MultiError::new();
        assert!(outer.append(Err(inner)));
        assert!(!outer.append(Ok(())));
        outer.push(c.clone());

        assert_eq!(outer.len(), 3);
        assert!(outer.contains(&a) && outer.contains(&b) && outer.contains(&c));
    }
}
