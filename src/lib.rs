//! Kernel and initrd image management for a boot partition.
//!
//! Distributions name their kernel images differently
//! (`kernel-genkernel-x86_64-5.10.42-sabayon`,
//! `kernel-vanilla-5.10.42-mocaccino`, ...). This crate classifies the files
//! of a boot directory with declarative naming profiles, pairs each kernel
//! with its initrd, and maintains the `bzImage`/`Initrd` links.
//!
//! - **Profiles** - [`profile::NamingProfile`] describes one naming scheme;
//!   its filename pattern is derived, never written by hand.
//! - **Codec** - [`image`] decodes filenames into kernel/initrd records and
//!   encodes them back.
//! - **Registry** - [`boot_files::BootFiles`] pairs images and answers
//!   lookups.
//! - **Scanner** - [`scan`] walks a boot directory into a registry.
//! - **Links** - [`links::set_links`] points `bzImage`/`Initrd` at an entry.
//!
//! Initrd generation ([`initrd`]) and bootloader regeneration ([`grub`]) are
//! thin wrappers around external tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use boot_kernels::{profile::default_profiles, scan::read_boot_dir};
//!
//! let boot = read_boot_dir("/boot".as_ref(), default_profiles())?;
//! for entry in boot.files() {
//!     println!("{} kernel={} initrd={}", entry.version(), entry.has_kernel(), entry.has_initrd());
//! }
//! ```

pub mod boot_files;
pub mod config;
pub mod error;
pub mod grub;
pub mod image;
pub mod initrd;
pub mod links;
pub mod profile;
pub mod release;
pub mod scan;

pub use boot_files::{BootFiles, KernelFiles, BZIMAGE_LINK, INITRD_LINK};
pub use config::Config;
pub use error::{Error, Result};
pub use image::{InitrdImage, KernelImage};
pub use initrd::{DracutBuilder, InitrdBuilder};
pub use links::{set_links, LinkOutcome};
pub use profile::{CompiledProfile, NamingProfile, ProfileSet};
pub use scan::{read_boot_dir, scan_boot_dir};
