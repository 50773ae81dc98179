pub mod achievements;
pub mod challenges;
pub mod identity;
pub mod quizzes;
pub mod rest;
pub mod state;

// Re-export the extractor and the OpenAPI master definition for the binaries.
pub use identity::UserId;
pub use rest::ApiDoc;
