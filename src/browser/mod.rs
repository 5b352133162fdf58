pub mod mock;
pub mod selector;
pub mod session;
pub mod webdriver;
