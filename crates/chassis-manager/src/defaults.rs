//! Engine constants applied when a port entry leaves a parameter unset.

use chassis_types::{MacAddress, PacketDirection};

pub use chassis_device::CONTROL_PORT_BASE as SDK_PORT_CONTROL_BASE;
pub use chassis_types::CPU_PORT_ID;

/// MTU programmed when a port entry does not specify one.
pub const DEFAULT_MTU: u32 = 1514;

/// Largest MTU accepted by verify.
pub const MAX_MTU: u32 = 65535;

pub const DEFAULT_PIPELINE_NAME: &str = "pipe";

pub const DEFAULT_MEMPOOL_NAME: &str = "MEMPOOL0";

pub const DEFAULT_PACKET_DIRECTION: PacketDirection = PacketDirection::Host;

/// Placeholder answered for MAC address and LACP router MAC queries.
pub const DUMMY_MAC_ADDRESS: MacAddress = MacAddress::from_u64(0x1122_3344_5566);

/// Vendor name reported in node info.
pub const VENDOR_NAME: &str = "DPDK";
