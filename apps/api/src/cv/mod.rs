// CV document generation and the surrounding HTTP endpoints.
// generator drives the pipeline and its collaborators; handlers adapt it to Axum.
// Parsing uploaded CVs and the format adapter endpoints live in handlers too.

pub mod generator;
pub mod handlers;
