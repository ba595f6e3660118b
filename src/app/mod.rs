pub mod ports;
pub mod clean_use_case;
pub mod extract_use_case;
pub mod report_use_case;
pub mod retrieve_use_case;
