// Pipeline processing: normalization of extracted field bags

pub mod normalize;
