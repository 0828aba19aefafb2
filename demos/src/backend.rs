//! Backend selection based on feature flags.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "wgpu")] {
        use burn::backend::wgpu::{Wgpu, WgpuDevice};

        /// Selected backend type
        pub type SelectedBackend = Wgpu;
        /// Selected device type
        pub type SelectedDevice = WgpuDevice;

        pub fn create_device() -> SelectedDevice {
            WgpuDevice::default()
        }

        /// Backend name for logging
        pub const fn get_backend_name() -> &'static str {
            "WGPU (GPU)"
        }
    } else {
        use burn::backend::ndarray::{NdArray, NdArrayDevice};

        /// Selected backend type
        pub type SelectedBackend = NdArray;
        /// Selected device type
        pub type SelectedDevice = NdArrayDevice;

        pub fn create_device() -> SelectedDevice {
            NdArrayDevice::default()
        }

        /// Backend name for logging
        pub const fn get_backend_name() -> &'static str {
            "NdArray (CPU)"
        }
    }
}
