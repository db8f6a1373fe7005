//! Head byte constants.
//!
//! The first byte of every encoded value selects both its logical type and
//! the widths of any length/offset fields that follow.

// Reserved, never emitted.
pub const NONE: u8 = 0x00;

// Empty array (single byte).
pub const EMPTY_ARRAY: u8 = 0x01;

// Array without index table, byte length in 1/2/4/8 bytes.
// All members have identical byte size.
pub const ARRAY_UNINDEXED_1: u8 = 0x02;
pub const ARRAY_UNINDEXED_8: u8 = 0x05;

// Array with index table, byte length and offsets in 1/2/4/8 bytes.
pub const ARRAY_INDEXED_1: u8 = 0x06;
pub const ARRAY_INDEXED_8: u8 = 0x09;

// Empty object (single byte).
pub const EMPTY_OBJECT: u8 = 0x0a;

// Object with sorted index table, widths 1/2/4/8.
pub const OBJECT_SORTED_1: u8 = 0x0b;
pub const OBJECT_SORTED_8: u8 = 0x0e;

// Object with index table in insertion order, widths 1/2/4/8.
pub const OBJECT_UNSORTED_1: u8 = 0x0f;
pub const OBJECT_UNSORTED_8: u8 = 0x12;

// Compact compounds: varint byte length, no index table,
// varint item count stored reversed at the end.
pub const ARRAY_COMPACT: u8 = 0x13;
pub const OBJECT_COMPACT: u8 = 0x14;

// 0x15..0x16 reserved.

pub const ILLEGAL: u8 = 0x17;
pub const NULL: u8 = 0x18;
pub const FALSE: u8 = 0x19;
pub const TRUE: u8 = 0x1a;

// IEEE-754 binary64, 8 little-endian payload bytes.
pub const DOUBLE: u8 = 0x1b;

// Signed millis since epoch, 8 little-endian payload bytes.
pub const UTC_DATE: u8 = 0x1c;

// Opaque pointer-width payload; never produced by serialization.
pub const EXTERNAL: u8 = 0x1d;

pub const MIN_KEY: u8 = 0x1e;
pub const MAX_KEY: u8 = 0x1f;

// Signed integer, two's complement, little-endian,
// 1..8 payload bytes (head - 0x1f).
pub const INT_1: u8 = 0x20;
pub const INT_8: u8 = 0x27;

// Unsigned integer, little-endian, 1..8 payload bytes (head - 0x27).
pub const UINT_1: u8 = 0x28;
pub const UINT_8: u8 = 0x2f;

// Single-byte integers: 0x30..0x39 = 0..9, 0x3a..0x3f = -6..-1.
pub const SMALLINT_ZERO: u8 = 0x30;
pub const SMALLINT_NINE: u8 = 0x39;
pub const SMALLINT_NEG_SIX: u8 = 0x3a;
pub const SMALLINT_NEG_ONE: u8 = 0x3f;

// Short string, UTF-8 payload of head - 0x40 bytes (0..126).
pub const STRING_SHORT_EMPTY: u8 = 0x40;
pub const STRING_SHORT_MAX: u8 = 0xbe;
pub const STRING_SHORT_MAX_LEN: usize = 126;

// Long string, 8-byte little-endian length, then payload.
pub const STRING_LONG: u8 = 0xbf;

// Binary, 1..8-byte little-endian length (head - 0xbf), then payload.
pub const BINARY_1: u8 = 0xc0;
pub const BINARY_8: u8 = 0xc7;

// Packed decimals: 1..8-byte length, signed 4-byte exponent, BCD bytes.
pub const BCD_POS_1: u8 = 0xc8;
pub const BCD_POS_8: u8 = 0xcf;
pub const BCD_NEG_1: u8 = 0xd0;
pub const BCD_NEG_8: u8 = 0xd7;

// 0xd8..0xed reserved.

// Tagged value: tag id (1 or 8 little-endian bytes), then one inner value.
pub const TAGGED_SHORT: u8 = 0xee;
pub const TAGGED_LONG: u8 = 0xef;

// Custom types. 0xf0..0xf3 carry fixed 1/2/4/8-byte payloads,
// 0xf4..0xf6 a 1/2/4-byte length field; 0xf7..0xff are opaque.
pub const CUSTOM_FIXED_1: u8 = 0xf0;
pub const CUSTOM_FIXED_8: u8 = 0xf3;
pub const CUSTOM_LENGTH_1: u8 = 0xf4;
pub const CUSTOM_LENGTH_4: u8 = 0xf6;
pub const CUSTOM_OPAQUE_FIRST: u8 = 0xf7;
