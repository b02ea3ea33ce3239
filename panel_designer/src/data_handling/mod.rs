pub mod annotation;
pub mod gene_list;
pub mod interval_file;
