//! Kernel name normalization
//!
//! Turns a demangled kernel symbol into the short display name used in
//! reports: no return type, no template arguments, no parameter list, and
//! none of the namespaces every ATen/CUB kernel carries.

/// Prefix the demangler emits for kernels in an unnamed namespace
const UNNAMED_NAMESPACE_PREFIX: &str = "void <unnamed>::";

/// Substrings removed wherever they occur
const NOISE: &[&str] = &[
    "void ",
    "at::",
    "cuda::",
    "at_cuda_detail::",
    "native::",
    "(anonymous namespace)::",
];

/// Shorten a demangled kernel name for display
///
/// ```
/// use kernscope_gpu::name::shorten;
///
/// assert_eq!(shorten("void at::native::foo<float>(int)"), "foo");
/// assert_eq!(shorten("volta_sgemm_128x64_nn"), "volta_sgemm_128x64_nn");
/// ```
pub fn shorten(long_name: &str) -> String {
    let name = long_name.replace(UNNAMED_NAMESPACE_PREFIX, "");

    let untemplated = match name.find('<') {
        Some(pos) => &name[..pos],
        None => name.as_str(),
    };

    let mut short = untemplated.to_string();
    for noise in NOISE {
        short = short.replace(noise, "");
    }

    if let Some(pos) = short.find('(') {
        short.truncate(pos);
    }
    short
}

/// Long and short form of one kernel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelName {
    pub long: String,
    pub short: String,
}

impl KernelName {
    /// Build both forms from an already demangled name
    pub fn from_demangled(long: String) -> Self {
        let short = shorten(&long);
        Self { long, short }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_strips_namespaces_templates_and_params() {
        assert_eq!(shorten("void at::native::foo<T>(int)"), "foo");
        assert_eq!(
            shorten("void at::native::(anonymous namespace)::upsample_kernel<float>(float*)"),
            "upsample_kernel"
        );
        assert_eq!(
            shorten("void at::cuda::at_cuda_detail::cub::DeviceScanKernel<int>(int)"),
            "cub::DeviceScanKernel"
        );
    }

    #[test]
    fn test_shorten_unnamed_namespace() {
        assert_eq!(shorten("void <unnamed>::bar(float)"), "bar");
    }

    #[test]
    fn test_shorten_plain_names() {
        assert_eq!(shorten(""), "");
        assert_eq!(shorten("volta_sgemm_128x64_nn"), "volta_sgemm_128x64_nn");
        assert_eq!(shorten("add(float*, float*)"), "add");
        assert_eq!(shorten("ampere_h16816gemm<half>"), "ampere_h16816gemm");
    }

    #[test]
    fn test_truncation_happens_before_noise_removal() {
        // `native::` inside the template arguments is cut off, not stripped
        assert_eq!(shorten("kernel<at::native::Op>(int)"), "kernel");
        // a parenthesis inside the template arguments does not matter
        assert_eq!(shorten("void reduce<(int)4>(float)"), "reduce");
    }

    #[test]
    fn test_kernel_name_from_demangled() {
        let name = KernelName::from_demangled("void at::native::vectorized_elementwise_kernel<4>(int)".into());
        assert_eq!(name.short, "vectorized_elementwise_kernel");
        assert!(name.long.starts_with("void at::native::"));
    }
}
