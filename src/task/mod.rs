// Declare submodules
pub mod routes;
pub mod task_dto;
pub mod task_event;
pub mod task_handlers;
pub mod task_models;
pub mod task_publisher;
pub mod task_repository;
pub mod task_service;

// Re-export public items
pub use routes::task_routes;
pub use task_models::Task;
pub use task_publisher::EventPublisher;
pub use task_repository::PgTaskRepository;
pub use task_service::TaskService;
