//! Short code generation
//!
//! Codes are drawn from the thread-local CSPRNG over a configurable
//! alphabet. Uniqueness is never assumed: callers either probe with
//! [`CodeGenerator::generate`] or let the store's atomic create decide via
//! [`CodeGenerator::issue_with`].

use std::future::Future;

use tracing::{debug, warn};

use crate::config::CodesConfig;
use crate::errors::{Result, SnaplinkError};

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    max_attempts: u32,
}

impl CodeGenerator {
    pub fn new(alphabet: &str, length: usize, max_attempts: u32) -> Result<Self> {
        Self::from_config(&CodesConfig {
            alphabet: alphabet.to_string(),
            length,
            max_attempts,
        })
    }

    pub fn from_config(config: &CodesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            alphabet: config.alphabet.chars().collect(),
            length: config.length,
            max_attempts: config.max_attempts,
        })
    }

    /// One uniform draw. Pure apart from the RNG.
    pub fn generate_one(&self) -> String {
        std::iter::repeat_with(|| self.alphabet[rand::random_range(0..self.alphabet.len())])
            .take(self.length)
            .collect()
    }

    /// Draws until `is_taken` reports a free code.
    pub fn generate<F>(&self, is_taken: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        for _ in 0..self.max_attempts {
            let code = self.generate_one();
            if !is_taken(&code) {
                return Ok(code);
            }
        }
        Err(self.exhausted())
    }

    /// Runs `attempt` with a fresh code until it stops reporting `Collision`.
    ///
    /// Any other error is returned unchanged.
    pub async fn issue_with<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for n in 1..=self.max_attempts {
            let code = self.generate_one();
            match attempt(code.clone()).await {
                Err(SnaplinkError::Collision(_)) => {
                    debug!(
                        "Code '{}' collided (attempt {}/{})",
                        code, n, self.max_attempts
                    );
                }
                other => return other,
            }
        }
        Err(self.exhausted())
    }

    /// Whether `code` could have been produced by this generator.
    pub fn conforms(&self, code: &str) -> bool {
        code.chars().count() == self.length && code.chars().all(|c| self.alphabet.contains(&c))
    }

    /// log2 of the code space size.
    pub fn keyspace_bits(&self) -> f64 {
        self.length as f64 * (self.alphabet.len() as f64).log2()
    }

    fn exhausted(&self) -> SnaplinkError {
        warn!(
            target: "snaplink::events",
            event = "code_space_pressure",
            attempts = self.max_attempts,
            length = self.length,
            keyspace_bits = self.keyspace_bits(),
            "No free code after {} attempts; consider increasing codes.length",
            self.max_attempts
        );
        SnaplinkError::capacity_exhausted(format!(
            "no free code of length {} after {} attempts",
            self.length, self.max_attempts
        ))
    }
}

/// User-supplied codes: same charset as generated ones, 1..=64 chars.
pub fn validate_custom_code(code: &str) -> Result<()> {
    if code.is_empty() || code.len() > 64 {
        return Err(SnaplinkError::validation(
            "Custom code must be between 1 and 64 characters",
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SnaplinkError::validation(format!(
            "Invalid short code '{}'. Only letters, digits, '-' and '_' are allowed",
            code
        )));
    }
    if crate::utils::RESERVED_CODES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(code))
    {
        return Err(SnaplinkError::validation(format!(
            "Short code '{}' conflicts with a reserved route",
            code
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn generator() -> CodeGenerator {
        CodeGenerator::from_config(&CodesConfig::default()).unwrap()
    }

    #[test]
    fn test_generated_codes_conform() {
        let g = CodeGenerator::new("abc", 12, 5).unwrap();
        for _ in 0..200 {
            let code = g.generate_one();
            assert_eq!(code.len(), 12);
            assert!(code.chars().all(|c| "abc".contains(c)));
            assert!(g.conforms(&code));
        }
    }

    #[test]
    fn test_codes_are_not_constant() {
        let g = generator();
        let codes: HashSet<String> = (0..100).map(|_| g.generate_one()).collect();
        assert!(codes.len() > 90);
    }

    #[test]
    fn test_generate_skips_taken_codes() {
        let g = generator();
        let calls = Mutex::new(0);
        let code = g
            .generate(|_| {
                let mut n = calls.lock().unwrap();
                *n += 1;
                *n < 3
            })
            .unwrap();
        assert_eq!(code.len(), 7);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_generate_exhausts() {
        let g = CodeGenerator::new("ab", 1, 5).unwrap();
        let err = g.generate(|_| true).unwrap_err();
        assert!(matches!(err, SnaplinkError::CapacityExhausted(_)));
    }

    #[tokio::test]
    async fn test_issue_with_retries_on_collision_only() {
        let g = generator();
        let mut attempts = 0;
        let issued = g
            .issue_with(|code| {
                attempts += 1;
                let n = attempts;
                async move {
                    if n < 3 {
                        Err(SnaplinkError::collision("taken"))
                    } else {
                        Ok(code)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(issued.len(), 7);
        assert_eq!(attempts, 3);

        let mut attempts = 0;
        let err = g
            .issue_with(|_| {
                attempts += 1;
                async { Err::<String, _>(SnaplinkError::unavailable("down")) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SnaplinkError::Unavailable(_)));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_issue_with_exhausts_after_max_attempts() {
        let g = CodeGenerator::new("ab", 4, 5).unwrap();
        let mut attempts = 0;
        let err = g
            .issue_with(|_| {
                attempts += 1;
                async { Err::<(), _>(SnaplinkError::collision("taken")) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SnaplinkError::CapacityExhausted(_)));
        assert_eq!(attempts, 5);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(CodeGenerator::new("a", 6, 5).is_err());
        assert!(CodeGenerator::new("abc", 0, 5).is_err());
        assert!(CodeGenerator::new("ab$", 6, 5).is_err());
    }

    #[test]
    fn test_validate_custom_code() {
        assert!(validate_custom_code("my-link_1").is_ok());
        assert!(validate_custom_code("").is_err());
        assert!(validate_custom_code("has space").is_err());
        assert!(validate_custom_code("a/b").is_err());
        assert!(validate_custom_code("admin").is_err());
        assert!(validate_custom_code("API").is_err());
        assert!(validate_custom_code(&"x".repeat(65)).is_err());
    }
}
