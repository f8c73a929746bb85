//! Battle skeleton file (`**aa`) — 52 bytes of little-endian i32 counts.
//!
//! Battle locations are static: the skeleton carries no bones and no
//! animations, only the piece and texture counts the runtime uses to load
//! the sibling files.

use std::io::Cursor;

use anyhow::Result;
use binrw::{binrw, BinRead, BinWrite};

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BattleSkeleton {
    /// 1 = battle location.
    pub skeleton_type: i32,
    /// Always 1.
    pub unk1: i32,
    /// 0 for battle locations.
    pub unk2: i32,
    pub n_bones: i32,
    pub unk3: i32,
    /// Number of model pieces.
    pub n_joints: i32,
    /// Number of texture pages.
    pub n_textures: i32,
    pub n_skeleton_anims: i32,
    pub unk4: i32,
    pub n_weapons: i32,
    pub n_weapon_anims: i32,
    pub unk5: i32,
    pub unk6: i32,
}

impl BattleSkeleton {
    pub const SIZE: usize = 52;

    /// Skeleton for a static battle location with the given piece and
    /// texture counts.
    pub fn for_location(n_joints: i32, n_textures: i32) -> Self {
        Self {
            skeleton_type: 1,
            unk1: 1,
            n_joints,
            n_textures,
            ..Self::default()
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        // 52 fixed bytes into a Vec cannot fail to write.
        self.write(&mut cursor).expect("skeleton serialization");
        cursor.into_inner()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        Ok(Self::read(&mut cursor)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_52_bytes_with_fixed_counts() {
        let bytes = BattleSkeleton::for_location(7, 3).to_bytes();
        assert_eq!(bytes.len(), BattleSkeleton::SIZE);
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes()); // type
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes()); // unk1
        assert_eq!(&bytes[12..16], &0i32.to_le_bytes()); // no bones
        assert_eq!(&bytes[20..24], &7i32.to_le_bytes()); // joints
        assert_eq!(&bytes[24..28], &3i32.to_le_bytes()); // textures
        assert!(bytes[28..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trips_byte_exactly() {
        let skeleton = BattleSkeleton::for_location(12, 9);
        let bytes = skeleton.to_bytes();
        let reread = BattleSkeleton::from_bytes(&bytes).unwrap();
        assert_eq!(reread, skeleton);
        assert_eq!(reread.to_bytes(), bytes);
    }
}
