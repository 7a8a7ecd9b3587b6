pub mod account;
pub mod admin;
pub mod auth;
pub mod color_theory;
pub mod config;
pub mod csv_data;
pub mod error;
pub mod head_to_head;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod model;
pub mod prediction_export;
pub mod repository;
pub mod score_pattern;
pub mod seasonal;
pub mod stadium;
pub mod state;
pub mod store;
pub mod weather;
pub mod win_prob;

pub use error::{AuthError, InputError};
pub use model::{PredictionInput, PredictionRequest, PredictionResult};
pub use repository::{MatchRepository, MemoryRepository};
pub use win_prob::predict_match;
