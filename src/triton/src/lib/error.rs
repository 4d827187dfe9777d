/// The type to represent triton CLI results.
pub type TritonResult<T = ()> = anyhow::Result<T>;
