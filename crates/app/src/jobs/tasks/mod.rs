pub mod visit_retention;
