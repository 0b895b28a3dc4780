pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod oracle;

pub mod components {
    pub mod review_form;
}

pub mod models {
    pub mod prediction;
    pub mod review;
}
