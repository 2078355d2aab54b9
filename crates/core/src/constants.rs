// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Constants fixed by the bytecode asset format and the wire protocol.
//! These are not tunables: guest images and the snapshot/net ring layouts
//! are byte-compatible with a fixed engine build that shipped with these
//! values baked in.

/// Maximum number of simultaneously connected clients.
pub const MAX_CLIENTS: usize = 64;

/// Maximum number of live entities in the shared world.
pub const MAX_ENTITIES: usize = 1024;

/// Wire protocol version exchanged during the connect handshake.
pub const PROTOCOL: u32 = 68;

/// Snapshots retained per client in the ring before being overwritten.
pub const PACKET_BACKUP: usize = 32;

/// Capacity of each net channel's reliable/server command rings. Must be a
/// power of two; ring indices are taken modulo this value.
pub const NET_CHAN_RING: u32 = 128;

/// Fixed server tick period in milliseconds (20 Hz).
pub const FRAME_MSEC: u32 = 50;

/// Byte size of the network-visible entity state record copied out of a
/// gentity.
pub const ENTITY_STATE_SIZE: usize = 208;

/// Byte offset of the host-visible `entityShared` record within a gentity.
///
/// This contradicts the state record's documented 208-byte size; it was
/// established empirically against the guest compiler's struct layout and
/// is part of the external interface. Guest images are unmodified binary
/// assets, so this offset is carried as-is rather than "corrected".
pub const ENTITY_SHARED_OFFSET: usize = 416;

/// Magic number at the start of a valid bytecode image file.
pub const VM_MAGIC: u32 = 0x1272_1444;

/// Size in bytes of each VM instance's program stack. Not part of the
/// bytecode file header; fixed by the engine build that produced these
/// guest images.
pub const PROGRAM_STACK_SIZE: u32 = 0x10000;

/// Minimum operand stack capacity an interpreter invocation must provide.
pub const OPERAND_STACK_MIN: usize = 1024;

/// Default iteration cap protecting the host from a runaway guest loop.
pub const DEFAULT_ITERATION_CAP: u64 = 100_000_000;

/// Transport loopback queue capacity, per direction.
pub const LOOPBACK_QUEUE_CAPACITY: usize = 64;

/// Distance bound (world units) used as the default visibility policy for
/// snapshot construction, standing in for real BSP cluster visibility.
pub const DEFAULT_VISIBILITY_DISTANCE: f32 = 8192.0;

/// Maximum depth of the world sector binary tree.
pub const MAX_WORLD_SECTORS: usize = 64;

/// Number of configstring slots.
pub const MAX_CONFIGSTRINGS: usize = 1024;

/// Byte size of one guest player-state record, mirrored into a client's
/// snapshot descriptor at build time. Fixed by the same guest ABI that
/// fixes `ENTITY_STATE_SIZE`.
pub const PLAYER_STATE_SIZE: usize = 128;
