//! Little-endian wire codec for the twelve packet kinds exchanged between
//! client and server. Hand-rolled rather than derived: `EnemyState` trails
//! optional fields read only "if bytes remain", a shape plain
//! `#[derive(Serialize, Deserialize)]` enums cannot express.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use thiserror::Error;

use crate::enemy::EnemyVariant;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown message type byte {0}")]
    UnknownMessageType(u8),
    #[error("unknown enemy variant tag {0}")]
    UnknownVariantTag(u8),
    #[error("truncated packet: {0}")]
    Truncated(#[from] std::io::Error),
    #[error("invalid utf-8 map payload")]
    InvalidUtf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    PlayerConnect = 0,
    PlayerDisconnect = 1,
    GameState = 2,
    PlayerInput = 3,
    Ping = 4,
    Pong = 5,
    MapData = 6,
    PlayerTeleport = 7,
    EnemyUpdate = 8,
    PlayerDowned = 9,
    PlayerCursed = 10,
    ResetPosition = 11,
}

impl MessageType {
    fn from_byte(b: u8) -> Result<Self, CodecError> {
        Ok(match b {
            0 => MessageType::PlayerConnect,
            1 => MessageType::PlayerDisconnect,
            2 => MessageType::GameState,
            3 => MessageType::PlayerInput,
            4 => MessageType::Ping,
            5 => MessageType::Pong,
            6 => MessageType::MapData,
            7 => MessageType::PlayerTeleport,
            8 => MessageType::EnemyUpdate,
            9 => MessageType::PlayerDowned,
            10 => MessageType::PlayerCursed,
            11 => MessageType::ResetPosition,
            other => return Err(CodecError::UnknownMessageType(other)),
        })
    }
}

/// Keyboard/mouse/joystick input bits, packed into one byte on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputBits {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub mouse_control: bool,
    pub shift: bool,
    pub joystick_control: bool,
}

impl InputBits {
    fn to_byte(self) -> u8 {
        (self.move_up as u8)
            | ((self.move_down as u8) << 1)
            | ((self.move_left as u8) << 2)
            | ((self.move_right as u8) << 3)
            | ((self.mouse_control as u8) << 4)
            | ((self.shift as u8) << 5)
            | ((self.joystick_control as u8) << 6)
    }

    fn from_byte(b: u8) -> Self {
        InputBits {
            move_up: b & 1 != 0,
            move_down: b & 2 != 0,
            move_left: b & 4 != 0,
            move_right: b & 8 != 0,
            mouse_control: b & 16 != 0,
            shift: b & 32 != 0,
            joystick_control: b & 64 != 0,
        }
    }
}

/// A directional reading taken from the mouse or a joystick: a unit-ish
/// direction plus a normalized magnitude in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogDirection {
    pub dir_x: f32,
    pub dir_y: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInput {
    pub bits: InputBits,
    pub mouse: Option<AnalogDirection>,
    pub joystick: Option<AnalogDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStateMsg {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub is_downed: bool,
    pub downed_timer: u8,
    pub is_cursed: bool,
    pub cursed_timer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStateMsg {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub variant: EnemyVariant,
    pub speed: Option<f32>,
    pub min_speed: Option<f32>,
    pub max_speed: Option<f32>,
    pub change_progress: Option<f32>,
    pub is_speed_increasing: Option<bool>,
    pub is_harmless: Option<bool>,
    pub harmless_progress: Option<f32>,
    pub aura_size: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    PlayerConnect,
    PlayerDisconnect,
    GameState {
        tick: u32,
        players: Vec<PlayerStateMsg>,
    },
    PlayerInput(PlayerInput),
    Ping,
    Pong,
    MapData(String),
    PlayerTeleport {
        player_id: u32,
        x: f32,
        y: f32,
    },
    EnemyUpdate {
        enemies: Vec<EnemyStateMsg>,
    },
    PlayerDowned {
        player_id: u32,
        is_down: bool,
        seconds_remaining: u8,
    },
    PlayerCursed {
        player_id: u32,
        is_cursed: bool,
        seconds_remaining: f32,
    },
    ResetPosition {
        player_id: u32,
    },
}

fn write_player_state(w: &mut impl Write, p: &PlayerStateMsg) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(p.id)?;
    w.write_f32::<LittleEndian>(p.x)?;
    w.write_f32::<LittleEndian>(p.y)?;
    w.write_f32::<LittleEndian>(p.radius)?;
    w.write_u8(p.is_downed as u8)?;
    w.write_u8(p.downed_timer)?;
    w.write_u8(p.is_cursed as u8)?;
    w.write_f32::<LittleEndian>(p.cursed_timer)?;
    Ok(())
}

fn read_player_state(r: &mut impl Read) -> std::io::Result<PlayerStateMsg> {
    Ok(PlayerStateMsg {
        id: r.read_u32::<LittleEndian>()?,
        x: r.read_f32::<LittleEndian>()?,
        y: r.read_f32::<LittleEndian>()?,
        radius: r.read_f32::<LittleEndian>()?,
        is_downed: r.read_u8()? != 0,
        downed_timer: r.read_u8()?,
        is_cursed: r.read_u8()? != 0,
        cursed_timer: r.read_f32::<LittleEndian>()?,
    })
}

fn write_enemy_state(w: &mut impl Write, e: &EnemyStateMsg) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(e.id)?;
    w.write_f32::<LittleEndian>(e.x)?;
    w.write_f32::<LittleEndian>(e.y)?;
    w.write_f32::<LittleEndian>(e.radius)?;
    w.write_u8(e.variant as u8)?;
    if let Some(speed) = e.speed {
        w.write_f32::<LittleEndian>(speed)?;
        w.write_f32::<LittleEndian>(e.min_speed.unwrap_or(0.0))?;
        w.write_f32::<LittleEndian>(e.max_speed.unwrap_or(0.0))?;
        w.write_f32::<LittleEndian>(e.change_progress.unwrap_or(0.0))?;
        w.write_u8(e.is_speed_increasing.unwrap_or(false) as u8)?;
        if let Some(harmless) = e.is_harmless {
            w.write_u8(harmless as u8)?;
            w.write_f32::<LittleEndian>(e.harmless_progress.unwrap_or(0.0))?;
            if let Some(aura) = e.aura_size {
                w.write_f32::<LittleEndian>(aura)?;
            }
        }
    }
    Ok(())
}

fn read_enemy_state(r: &mut Cursor<&[u8]>) -> Result<EnemyStateMsg, CodecError> {
    let id = r.read_u32::<LittleEndian>()?;
    let x = r.read_f32::<LittleEndian>()?;
    let y = r.read_f32::<LittleEndian>()?;
    let radius = r.read_f32::<LittleEndian>()?;
    let variant_byte = r.read_u8()?;
    let variant = EnemyVariant::from_byte(variant_byte)
        .ok_or(CodecError::UnknownVariantTag(variant_byte))?;

    let remaining = r.get_ref().len() as u64 - r.position();
    let mut msg = EnemyStateMsg {
        id,
        x,
        y,
        radius,
        variant,
        speed: None,
        min_speed: None,
        max_speed: None,
        change_progress: None,
        is_speed_increasing: None,
        is_harmless: None,
        harmless_progress: None,
        aura_size: None,
    };
    if remaining < 17 {
        return Ok(msg);
    }
    msg.speed = Some(r.read_f32::<LittleEndian>()?);
    msg.min_speed = Some(r.read_f32::<LittleEndian>()?);
    msg.max_speed = Some(r.read_f32::<LittleEndian>()?);
    msg.change_progress = Some(r.read_f32::<LittleEndian>()?);
    msg.is_speed_increasing = Some(r.read_u8()? != 0);

    let remaining = r.get_ref().len() as u64 - r.position();
    if remaining < 5 {
        return Ok(msg);
    }
    msg.is_harmless = Some(r.read_u8()? != 0);
    msg.harmless_progress = Some(r.read_f32::<LittleEndian>()?);

    let remaining = r.get_ref().len() as u64 - r.position();
    if remaining >= 4 {
        msg.aura_size = Some(r.read_f32::<LittleEndian>()?);
    }
    Ok(msg)
}

pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    match packet {
        Packet::PlayerConnect => {
            buf.write_u8(MessageType::PlayerConnect as u8).unwrap();
        }
        Packet::PlayerDisconnect => {
            buf.write_u8(MessageType::PlayerDisconnect as u8).unwrap();
        }
        Packet::GameState { tick, players } => {
            buf.write_u8(MessageType::GameState as u8).unwrap();
            buf.write_u32::<LittleEndian>(*tick).unwrap();
            buf.write_u16::<LittleEndian>(players.len() as u16).unwrap();
            for p in players {
                write_player_state(&mut buf, p).unwrap();
            }
        }
        Packet::PlayerInput(input) => {
            buf.write_u8(MessageType::PlayerInput as u8).unwrap();
            buf.write_u8(input.bits.to_byte()).unwrap();
            if input.bits.mouse_control {
                let m = input.mouse.unwrap_or(AnalogDirection {
                    dir_x: 0.0,
                    dir_y: 0.0,
                    distance: 0.0,
                });
                buf.write_f32::<LittleEndian>(m.dir_x).unwrap();
                buf.write_f32::<LittleEndian>(m.dir_y).unwrap();
                buf.write_f32::<LittleEndian>(m.distance).unwrap();
            }
            if input.bits.joystick_control {
                let j = input.joystick.unwrap_or(AnalogDirection {
                    dir_x: 0.0,
                    dir_y: 0.0,
                    distance: 0.0,
                });
                buf.write_f32::<LittleEndian>(j.dir_x).unwrap();
                buf.write_f32::<LittleEndian>(j.dir_y).unwrap();
                buf.write_f32::<LittleEndian>(j.distance).unwrap();
            }
        }
        Packet::Ping => {
            buf.write_u8(MessageType::Ping as u8).unwrap();
        }
        Packet::Pong => {
            buf.write_u8(MessageType::Pong as u8).unwrap();
        }
        Packet::MapData(json) => {
            buf.write_u8(MessageType::MapData as u8).unwrap();
            let bytes = json.as_bytes();
            buf.write_u32::<LittleEndian>(bytes.len() as u32).unwrap();
            buf.extend_from_slice(bytes);
        }
        Packet::PlayerTeleport { player_id, x, y } => {
            buf.write_u8(MessageType::PlayerTeleport as u8).unwrap();
            buf.write_u32::<LittleEndian>(*player_id).unwrap();
            buf.write_f32::<LittleEndian>(*x).unwrap();
            buf.write_f32::<LittleEndian>(*y).unwrap();
        }
        Packet::EnemyUpdate { enemies } => {
            buf.write_u8(MessageType::EnemyUpdate as u8).unwrap();
            buf.write_u16::<LittleEndian>(enemies.len() as u16).unwrap();
            for e in enemies {
                write_enemy_state(&mut buf, e).unwrap();
            }
        }
        Packet::PlayerDowned {
            player_id,
            is_down,
            seconds_remaining,
        } => {
            buf.write_u8(MessageType::PlayerDowned as u8).unwrap();
            buf.write_u32::<LittleEndian>(*player_id).unwrap();
            buf.write_u8(*is_down as u8).unwrap();
            buf.write_u8(*seconds_remaining).unwrap();
        }
        Packet::PlayerCursed {
            player_id,
            is_cursed,
            seconds_remaining,
        } => {
            buf.write_u8(MessageType::PlayerCursed as u8).unwrap();
            buf.write_u32::<LittleEndian>(*player_id).unwrap();
            buf.write_u8(*is_cursed as u8).unwrap();
            buf.write_f32::<LittleEndian>(*seconds_remaining).unwrap();
        }
        Packet::ResetPosition { player_id } => {
            buf.write_u8(MessageType::ResetPosition as u8).unwrap();
            buf.write_u32::<LittleEndian>(*player_id).unwrap();
        }
    }
    buf
}

pub fn decode(bytes: &[u8]) -> Result<Packet, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Truncated(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty packet",
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let kind = MessageType::from_byte(cursor.read_u8()?)?;
    Ok(match kind {
        MessageType::PlayerConnect => Packet::PlayerConnect,
        MessageType::PlayerDisconnect => Packet::PlayerDisconnect,
        MessageType::GameState => {
            let tick = cursor.read_u32::<LittleEndian>()?;
            let n = cursor.read_u16::<LittleEndian>()?;
            let mut players = Vec::with_capacity(n as usize);
            for _ in 0..n {
                players.push(read_player_state(&mut cursor)?);
            }
            Packet::GameState { tick, players }
        }
        MessageType::PlayerInput => {
            let bits = InputBits::from_byte(cursor.read_u8()?);
            let mouse = if bits.mouse_control {
                Some(AnalogDirection {
                    dir_x: cursor.read_f32::<LittleEndian>()?,
                    dir_y: cursor.read_f32::<LittleEndian>()?,
                    distance: cursor.read_f32::<LittleEndian>()?,
                })
            } else {
                None
            };
            let joystick = if bits.joystick_control {
                Some(AnalogDirection {
                    dir_x: cursor.read_f32::<LittleEndian>()?,
                    dir_y: cursor.read_f32::<LittleEndian>()?,
                    distance: cursor.read_f32::<LittleEndian>()?,
                })
            } else {
                None
            };
            Packet::PlayerInput(PlayerInput {
                bits,
                mouse,
                joystick,
            })
        }
        MessageType::Ping => Packet::Ping,
        MessageType::Pong => Packet::Pong,
        MessageType::MapData => {
            let len = cursor.read_u32::<LittleEndian>()? as usize;
            let start = cursor.position() as usize;
            let end = start + len;
            let slice = bytes
                .get(start..end)
                .ok_or_else(|| CodecError::Truncated(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)))?;
            let json = std::str::from_utf8(slice)
                .map_err(|_| CodecError::InvalidUtf8)?
                .to_string();
            Packet::MapData(json)
        }
        MessageType::PlayerTeleport => Packet::PlayerTeleport {
            player_id: cursor.read_u32::<LittleEndian>()?,
            x: cursor.read_f32::<LittleEndian>()?,
            y: cursor.read_f32::<LittleEndian>()?,
        },
        MessageType::EnemyUpdate => {
            let n = cursor.read_u16::<LittleEndian>()?;
            let mut enemies = Vec::with_capacity(n as usize);
            for _ in 0..n {
                enemies.push(read_enemy_state(&mut cursor)?);
            }
            Packet::EnemyUpdate { enemies }
        }
        MessageType::PlayerDowned => Packet::PlayerDowned {
            player_id: cursor.read_u32::<LittleEndian>()?,
            is_down: cursor.read_u8()? != 0,
            seconds_remaining: cursor.read_u8()?,
        },
        MessageType::PlayerCursed => Packet::PlayerCursed {
            player_id: cursor.read_u32::<LittleEndian>()?,
            is_cursed: cursor.read_u8()? != 0,
            seconds_remaining: cursor.read_f32::<LittleEndian>()?,
        },
        MessageType::ResetPosition => Packet::ResetPosition {
            player_id: cursor.read_u32::<LittleEndian>()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player() -> PlayerStateMsg {
        PlayerStateMsg {
            id: 7,
            x: 12.5,
            y: -4.0,
            radius: 15.0,
            is_downed: true,
            downed_timer: 42,
            is_cursed: false,
            cursed_timer: 0.0,
        }
    }

    #[test]
    fn game_state_round_trips() {
        let packet = Packet::GameState {
            tick: 99,
            players: vec![sample_player()],
        };
        let bytes = encode(&packet);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn enemy_update_round_trips_with_all_optional_fields() {
        let enemy = EnemyStateMsg {
            id: 3,
            x: 1.0,
            y: 2.0,
            radius: 10.0,
            variant: EnemyVariant::Wavering,
            speed: Some(5.0),
            min_speed: Some(2.0),
            max_speed: Some(8.0),
            change_progress: Some(0.5),
            is_speed_increasing: Some(true),
            is_harmless: Some(false),
            harmless_progress: Some(0.0),
            aura_size: Some(20.0),
        };
        let packet = Packet::EnemyUpdate {
            enemies: vec![enemy],
        };
        let bytes = encode(&packet);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn enemy_update_round_trips_without_optional_tail() {
        let enemy = EnemyStateMsg {
            id: 3,
            x: 1.0,
            y: 2.0,
            radius: 10.0,
            variant: EnemyVariant::Normal,
            speed: None,
            min_speed: None,
            max_speed: None,
            change_progress: None,
            is_speed_increasing: None,
            is_harmless: None,
            harmless_progress: None,
            aura_size: None,
        };
        let packet = Packet::EnemyUpdate {
            enemies: vec![enemy],
        };
        let bytes = encode(&packet);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn player_input_keyboard_only_round_trips() {
        let packet = Packet::PlayerInput(PlayerInput {
            bits: InputBits {
                move_left: true,
                move_up: true,
                ..Default::default()
            },
            mouse: None,
            joystick: None,
        });
        let bytes = encode(&packet);
        assert_eq!(bytes.len(), 2);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let bytes = [255u8];
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::UnknownMessageType(255))
        ));
    }

    #[test]
    fn map_data_round_trips_json() {
        let packet = Packet::MapData("{\"name\":\"test\"}".to_string());
        let bytes = encode(&packet);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }
}
