// Text helpers shared by extraction and normalization

pub mod text;
