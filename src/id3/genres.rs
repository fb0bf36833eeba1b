//! The standard ID3v1 genre list.

use crate::id3::constants::ID3V1_NO_GENRE;

/// Genres 0-79 as defined by ID3v1.
pub const ID3V1_GENRES: [&str; 80] = [
    "Blues",
    "Classic Rock",
    "Country",
    "Dance",
    "Disco",
    "Funk",
    "Grunge",
    "Hip-Hop",
    "Jazz",
    "Metal",
    "New Age",
    "Oldies",
    "Other",
    "Pop",
    "R&B",
    "Rap",
    "Reggae",
    "Rock",
    "Techno",
    "Industrial",
    "Alternative",
    "Ska",
    "Death Metal",
    "Pranks",
    "Soundtrack",
    "Euro-Techno",
    "Ambient",
    "Trip-Hop",
    "Vocal",
    "Jazz+Funk",
    "Fusion",
    "Trance",
    "Classical",
    "Instrumental",
    "Acid",
    "House",
    "Game",
    "Sound Clip",
    "Gospel",
    "Noise",
    "AlternRock",
    "Bass",
    "Soul",
    "Punk",
    "Space",
    "Meditative",
    "Instrumental Pop",
    "Instrumental Rock",
    "Ethnic",
    "Gothic",
    "Darkwave",
    "Techno-Industrial",
    "Electronic",
    "Pop-Folk",
    "Eurodance",
    "Dream",
    "Southern Rock",
    "Comedy",
    "Cult",
    "Gangsta",
    "Top 40",
    "Christian Rap",
    "Pop/Funk",
    "Jungle",
    "Native American",
    "Cabaret",
    "New Wave",
    "Psychadelic",
    "Rave",
    "Showtunes",
    "Trailer",
    "Lo-Fi",
    "Tribal",
    "Acid Punk",
    "Acid Jazz",
    "Polka",
    "Retro",
    "Musical",
    "Rock & Roll",
    "Hard Rock",
];

/// Genre byte for a genre string: a standard name (case-insensitive), a bare
/// index such as `"17"`, or the ID3v2 reference form `"(17)"`.
pub fn genre_index(genre: &str) -> u8 {
    let genre = genre.trim();
    let numeric = genre
        .strip_prefix('(')
        .and_then(|g| g.strip_suffix(')'))
        .unwrap_or(genre);
    if let Ok(index) = numeric.parse::<u8>() {
        return if (index as usize) < ID3V1_GENRES.len() {
            index
        } else {
            ID3V1_NO_GENRE
        };
    }

    ID3V1_GENRES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(genre))
        .map_or(ID3V1_NO_GENRE, |index| index as u8)
}
