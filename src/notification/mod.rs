// Declare submodules
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;
pub mod notification_subscriber;
pub mod routes;

// Re-export public items
pub use notification_models::NotificationView;
pub use notification_repository::NotificationRepository;
pub use notification_service::NotificationService;
pub use notification_subscriber::{Backoff, EventSubscriber};
pub use routes::notification_routes;
