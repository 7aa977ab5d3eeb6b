mod controls;
mod details;
mod panels;

pub(super) use panels::document_inputs;
