mod password_service;

pub use password_service::PasswordService;
