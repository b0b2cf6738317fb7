//! Request and Response models for the blog generator API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    ChangePasswordRequest, GenerateRequest, LoginRequest, RegisterRequest, TestNotificationQuery,
    WebhookRequest,
};
pub use responses::{
    CacheStatusResponse, MessageResponse, PostResponse, StatusResponse, TokenResponse,
    TopicsResponse,
};
