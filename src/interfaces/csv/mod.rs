pub mod hierarchy_reader;
pub mod report_writer;
