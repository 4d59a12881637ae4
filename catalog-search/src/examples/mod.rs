pub mod support;

pub mod example01_compile_request;
pub mod example02_multi_select_facets;
pub mod example03_configured_defaults;
