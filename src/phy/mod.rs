//! Ethernet PHY access
//!
//! The PHY is reached only through an [`MdioBus`](crate::hal::MdioBus), so the
//! same code drives the on-chip management interface and a mock in tests.
//!
//! ```ignore
//! let mut smi = Smi::new(regs);
//! let phy = GenericPhy::new(1);
//! phy.soft_reset(&mut smi, &mut delay)?;
//! let link = phy.capabilities(&mut smi)?.clamp(requested);
//! phy.write_parameters(&mut smi, &link)?;
//! ```

pub mod generic;

pub use generic::{GenericPhy, LinkStatus, PhyCapabilities};

pub use crate::internal::phy_regs::standard::{ability, bmcr, bmsr, phy_reg};
