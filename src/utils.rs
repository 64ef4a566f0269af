pub mod flatten;
