//! Short code allocation
//!
//! A caller either brings its own code, which is validated and checked for
//! collisions, or gets a random one. Random draws are retried a bounded
//! number of times; the store's unique key stays the final arbiter.

use rand::{distr::Alphanumeric, Rng};
use tracing::debug;

use crate::error::AllocationError;
use crate::store::LinkStore;
use crate::validation::is_valid_code;

/// Length of generated codes
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Random draws attempted before giving up
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 10;

/// Source of candidate codes for random allocation.
///
/// Implementations are pure generators and never touch storage.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws codes uniformly from the 62-symbol alphanumeric alphabet
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

pub struct Allocator {
    generator: Box<dyn CodeGenerator>,
    max_attempts: u32,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(RandomCodeGenerator::default())
    }
}

impl Allocator {
    pub fn new(generator: impl CodeGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
            max_attempts: MAX_ALLOCATION_ATTEMPTS,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Produces a short code that is free at the time of the call.
    ///
    /// With a candidate, the candidate itself is returned or rejected; it
    /// is never replaced by a random code. Nothing is written to `store`.
    pub fn allocate(
        &self,
        store: &dyn LinkStore,
        candidate: Option<&str>,
    ) -> Result<String, AllocationError> {
        match candidate {
            Some(code) => {
                if !is_valid_code(code) {
                    return Err(AllocationError::InvalidFormat(code.to_string()));
                }
                if store.code_taken(code)? {
                    return Err(AllocationError::CodeTaken(code.to_string()));
                }
                Ok(code.to_string())
            }
            None => self.draw(store),
        }
    }

    fn draw(&self, store: &dyn LinkStore) -> Result<String, AllocationError> {
        for attempt in 1..=self.max_attempts {
            let code = self.generator.generate();
            if !store.code_taken(&code)? {
                return Ok(code);
            }
            debug!(attempt, code = %code, "generated short code collided");
        }

        Err(AllocationError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}
