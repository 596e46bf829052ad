//! Computer-keyboard piano layout.
//!
//! Two chromatic rows, tracker style: the bottom row starts at middle C
//! (pitch 60), the top row one octave up. Home-row and number-row keys
//! fill in the sharps.

/// Bottom row, C4 upward: z=C4, s=C#4, x=D4 ... ','=C5.
pub const LOWER_ROW: [(char, u8); 13] = [
    ('z', 60),
    ('s', 61),
    ('x', 62),
    ('d', 63),
    ('c', 64),
    ('v', 65),
    ('g', 66),
    ('b', 67),
    ('h', 68),
    ('n', 69),
    ('j', 70),
    ('m', 71),
    (',', 72),
];

/// Top row, C5 upward: q=C5, 2=C#5, w=D5 ... i=C6.
pub const UPPER_ROW: [(char, u8); 13] = [
    ('q', 72),
    ('2', 73),
    ('w', 74),
    ('3', 75),
    ('e', 76),
    ('r', 77),
    ('5', 78),
    ('t', 79),
    ('6', 80),
    ('y', 81),
    ('7', 82),
    ('u', 83),
    ('i', 84),
];

/// Maps a typed character to its pitch, if it is a note key.
pub fn pitch_for(ch: char) -> Option<u8> {
    let ch = ch.to_ascii_lowercase();
    LOWER_ROW
        .iter()
        .chain(UPPER_ROW.iter())
        .find(|(key, _)| *key == ch)
        .map(|(_, pitch)| *pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_chromatic_runs() {
        for row in [&LOWER_ROW, &UPPER_ROW] {
            for pair in row.windows(2) {
                assert_eq!(pair[1].1, pair[0].1 + 1);
            }
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_total() {
        assert_eq!(pitch_for('z'), Some(60));
        assert_eq!(pitch_for('Z'), Some(60));
        assert_eq!(pitch_for('i'), Some(84));
        assert_eq!(pitch_for('0'), None);
    }
}
