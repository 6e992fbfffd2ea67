//! FEN (Forsyth-Edwards Notation) parsing and serialization.
//!
//! A FEN string has six space-separated fields: piece placement, side to
//! move, castling rights, en-passant target, halfmove clock, fullmove
//! number.

use std::convert::TryFrom;

use crate::coretypes::{Castling, Color, File, Piece, Rank, Square};
use crate::error::{Error, ErrorKind, Result};
use crate::position::Position;

pub trait Fen: Sized {
    fn parse_fen(fen: &str) -> Result<Self>;
    fn to_fen(&self) -> String;
}

impl Fen for Position {
    fn parse_fen(fen: &str) -> Result<Self> {
        let mut fields = fen.split_whitespace();

        let placement = fields
            .next()
            .ok_or_else(|| Error::from((ErrorKind::FenFieldMissing, "missing piece placement")))?;
        let side_to_move = fields
            .next()
            .ok_or_else(|| Error::from((ErrorKind::FenFieldMissing, "missing side to move")))?;
        let castling = fields
            .next()
            .ok_or_else(|| Error::from((ErrorKind::FenFieldMissing, "missing castling rights")))?;
        let en_passant = fields
            .next()
            .ok_or_else(|| Error::from((ErrorKind::FenFieldMissing, "missing en passant target")))?;
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut position = Position::empty();
        parse_placement(placement, &mut position)?;

        position.set_side_to_move(match side_to_move {
            "w" => Color::White,
            "b" => Color::Black,
            _ => {
                return Err((ErrorKind::FenColorMalformed, "side to move must be 'w' or 'b'").into())
            }
        });

        position.set_castling(if castling == "-" {
            Castling::NONE
        } else {
            castling
                .parse::<Castling>()
                .map_err(|_| Error::from((ErrorKind::FenCastlingMalformed, "invalid castling field")))?
        });

        position.set_en_passant(if en_passant == "-" {
            None
        } else {
            Some(en_passant.parse::<Square>().map_err(|_| {
                Error::from((ErrorKind::FenEnPassantMalformed, "invalid en passant square"))
            })?)
        });

        position.set_halfmove_clock(
            halfmove
                .parse()
                .map_err(|_| Error::from((ErrorKind::FenHalfmoveMalformed, "halfmove clock not a number")))?,
        );
        position.set_fullmoves(
            fullmove
                .parse()
                .map_err(|_| Error::from((ErrorKind::FenFullmoveMalformed, "fullmove number not a number")))?,
        );

        position.recompute_check_state_pub();
        Ok(position)
    }

    fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(64);

        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let square =
                    Square::from_idx((File::from_u8(file).unwrap(), Rank::from_u8(rank).unwrap())).unwrap();
                match self.get_square(square) {
                    Some(piece) => {
                        if empty_run > 0 {
                            fen.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move().to_char());

        fen.push(' ');
        if self.castling().is_none() {
            fen.push('-');
        } else {
            fen.push_str(&castling_to_string(*self.castling()));
        }

        fen.push(' ');
        match self.en_passant() {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock().to_string());
        fen.push(' ');
        fen.push_str(&self.fullmoves().to_string());

        fen
    }
}

fn parse_placement(placement: &str, position: &mut Position) -> Result<()> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err((ErrorKind::FenPlacementMalformed, "expected 8 ranks separated by '/'").into());
    }

    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_from_top as u8;
        let mut file: u8 = 0;
        for c in rank_str.chars() {
            if let Some(empties) = c.to_digit(10) {
                file += empties as u8;
            } else {
                if file > 7 {
                    return Err((ErrorKind::FenPlacementMalformed, "rank overflows 8 files").into());
                }
                let piece = Piece::try_from(c)
                    .map_err(|_| Error::from((ErrorKind::FenPlacementMalformed, "invalid piece character")))?;
                let square =
                    Square::from_idx((File::from_u8(file).unwrap(), Rank::from_u8(rank).unwrap())).unwrap();
                position.set_square(square, Some(piece));
                file += 1;
            }
        }
        if file != 8 {
            return Err((ErrorKind::FenPlacementMalformed, "rank does not account for 8 files").into());
        }
    }
    Ok(())
}

fn castling_to_string(castling: Castling) -> String {
    let mut s = String::with_capacity(4);
    if castling.has(Castling::W_KING) {
        s.push('K');
    }
    if castling.has(Castling::W_QUEEN) {
        s.push('Q');
    }
    if castling.has(Castling::B_KING) {
        s.push('k');
    }
    if castling.has(Castling::B_QUEEN) {
        s.push('q');
    }
    s
}
