//! Packet flags for FBIP wire protocol

/// Packet flags (1 byte)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacketFlags(pub u8);

impl PacketFlags {
    pub const NONE: PacketFlags = PacketFlags(0);

    // Flag bits
    pub const COMPRESSED: u8 = 0b0000_0001;
    pub const ENCRYPTED: u8 = 0b0000_0010;
    pub const PRIORITY: u8 = 0b0000_0100;
    pub const FRAGMENTED: u8 = 0b0000_1000;

    /// Bits defined on the wire but not implemented by this version
    pub const UNSUPPORTED: u8 = Self::ENCRYPTED | Self::FRAGMENTED;

    #[inline]
    pub fn new(bits: u8) -> Self {
        PacketFlags(bits)
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    #[inline]
    pub fn is_encrypted(self) -> bool {
        self.0 & Self::ENCRYPTED != 0
    }

    #[inline]
    pub fn is_priority(self) -> bool {
        self.0 & Self::PRIORITY != 0
    }

    #[inline]
    pub fn is_fragmented(self) -> bool {
        self.0 & Self::FRAGMENTED != 0
    }

    /// Reserved bits that are set
    #[inline]
    pub fn unsupported(self) -> u8 {
        self.0 & Self::UNSUPPORTED
    }

    #[inline]
    pub fn set_compressed(&mut self, value: bool) {
        self.set(Self::COMPRESSED, value);
    }

    #[inline]
    pub fn set_priority(&mut self, value: bool) {
        self.set(Self::PRIORITY, value);
    }

    #[inline]
    fn set(&mut self, bit: u8, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

impl From<u8> for PacketFlags {
    fn from(bits: u8) -> Self {
        PacketFlags(bits)
    }
}

impl From<PacketFlags> for u8 {
    fn from(flags: PacketFlags) -> Self {
        flags.0
    }
}
