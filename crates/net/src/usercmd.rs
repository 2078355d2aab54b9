// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The per-frame input packet the client sends the server: view angles,
//! movement deltas, button bits, and the weapon selection, timestamped
//! with the client's own clock so retransmits are idempotent.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub const USERCMD_WIRE_SIZE: usize = 21;

/// Button bits packed into [`UserCmd::buttons`].
pub mod button {
    pub const ATTACK: u8 = 1 << 0;
    pub const TALK: u8 = 1 << 1;
    pub const USE_ITEM: u8 = 1 << 2;
    pub const GESTURE: u8 = 1 << 3;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserCmd {
    pub server_time: u32,
    pub angles: [i32; 3],
    pub forward_move: i8,
    pub right_move: i8,
    pub up_move: i8,
    pub buttons: u8,
    pub weapon: u8,
}

impl UserCmd {
    pub fn pack(&self) -> [u8; USERCMD_WIRE_SIZE] {
        let mut buf = [0u8; USERCMD_WIRE_SIZE];
        let mut w: &mut [u8] = &mut buf;
        w.write_u32::<LittleEndian>(self.server_time).unwrap();
        for axis in self.angles {
            w.write_i32::<LittleEndian>(axis).unwrap();
        }
        w.write_i8(self.forward_move).unwrap();
        w.write_i8(self.right_move).unwrap();
        w.write_i8(self.up_move).unwrap();
        w.write_u8(self.buttons).unwrap();
        w.write_u8(self.weapon).unwrap();
        buf
    }

    pub fn unpack(bytes: &[u8; USERCMD_WIRE_SIZE]) -> Self {
        let mut r: &[u8] = bytes;
        let server_time = r.read_u32::<LittleEndian>().unwrap();
        let angles = [
            r.read_i32::<LittleEndian>().unwrap(),
            r.read_i32::<LittleEndian>().unwrap(),
            r.read_i32::<LittleEndian>().unwrap(),
        ];
        let forward_move = r.read_i8().unwrap();
        let right_move = r.read_i8().unwrap();
        let up_move = r.read_i8().unwrap();
        let buttons = r.read_u8().unwrap();
        let weapon = r.read_u8().unwrap();
        UserCmd { server_time, angles, forward_move, right_move, up_move, buttons, weapon }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trips() {
        let cmd = UserCmd {
            server_time: 123456,
            angles: [100, -200, 300],
            forward_move: 127,
            right_move: -128,
            up_move: 0,
            buttons: button::ATTACK | button::USE_ITEM,
            weapon: 3,
        };
        let packed = cmd.pack();
        let unpacked = UserCmd::unpack(&packed);
        assert_eq!(cmd, unpacked);
    }
}
