//! Mapping of XMLTV categories and ratings onto the codes VDR stores in its EPG.
//!
//! Genre codes are ETSI EN 300 468 content nibbles (level 1 in the high nibble). Several
//! names that are common in XMLTV feeds map onto the same code. Lookups are exact and
//! case-sensitive.

/// Returns the content code of a category, or `None` for unknown categories.
pub fn genre_code(category: &str) -> Option<u8> {
    let code = match category {
        // Movie/Drama
        "Movie/Drama" | "Action" | "Crime drama" | "Drama" | "Film" => 0x10,
        "Detective/Thriller" | "Crime/Mystery" => 0x11,
        "Adventure/Western/War" => 0x12,
        "Science Fiction/Fantasy/Horror" | "Science fiction" => 0x13,
        "Comedy" | "Comedy-drama" | "Standup" => 0x14,
        "Soap/Melodrama/Folkloric" | "Soap" => 0x15,
        "Romance" => 0x16,
        "Serious/Classical/Religious/Historical Movie/Drama" => 0x17,
        "Adult Movie/Drama" | "Adults only" | "Adult" => 0x18,

        // News/Current affairs
        "News/Current Affairs" | "News" => 0x20,
        "News/Weather Report" | "Weather" => 0x21,
        "News Magazine" => 0x22,
        "Documentary" => 0x23,
        "Discussion/Inverview/Debate" => 0x24,

        // Show/Game show
        "Show/Game Show" => 0x30,
        "Game Show/Quiz/Contest" => 0x31,
        "Variety Show" => 0x32,
        "Talk Show" | "Talk" => 0x33,

        // Sports
        "Sports" | "Action sports" | "Bicycle" | "Boxing" | "Billiards" => 0x40,
        "Special Event" => 0x41,
        "Sport Magazine" => 0x42,
        "Football/Soccer" => 0x43,
        "Tennis/Squash" => 0x44,
        "Team Sports" | "Baseball" | "Basketball" => 0x45,
        "Athletics" | "Archery" => 0x46,
        "Motor Sport" => 0x47,
        "Water Sport" => 0x48,
        "Winter Sports" => 0x49,
        "Equestrian" => 0x4A,
        "Martial Sports" => 0x4B,

        // Children's/Youth
        "Children's/Youth Programme" | "Children" | "Animated" | "Anime" | "Animation" => 0x50,
        "Pre-school Children's Programme" => 0x51,
        "Entertainment Programme for 6 to 14" => 0x52,
        "Entertainment Programme for 10 to 16" => 0x53,
        "Informational/Educational/School Programme" | "Paid Programming" => 0x54,
        "Cartoons/Puppets" => 0x55,

        // Music/Ballet/Dance
        "Music/Ballet/Dance" | "Music" => 0x60,
        "Rock/Pop" => 0x61,
        "Serious/Classical Music" => 0x62,
        "Folk/Tradional Music" => 0x63,
        "Jazz" => 0x64,
        "Musical/Opera" => 0x65,
        "Ballet" => 0x66,

        // Arts/Culture
        "Arts/Culture" | "Arts/crafts" => 0x70,
        "Performing Arts" => 0x71,
        "Fine Arts" => 0x72,
        "Religion" | "Religous" => 0x73,
        "Popular Culture/Traditional Arts" => 0x74,
        "Literature" => 0x75,
        "Film/Cinema" => 0x76,
        "Experimental Film/Video" => 0x77,
        "Broadcasting/Press" => 0x78,
        "New Media" => 0x79,
        "Arts/Culture Magazine" => 0x7A,
        "Fashion" => 0x7B,

        // Social/Political/Economics
        "Social/Political/Economics" => 0x80,
        "Magazine/Report/Documentary" => 0x81,
        "Economics/Social Advisory" => 0x82,
        "Remarkable People" => 0x83,

        // Education/Science/Factual
        "Education/Science/Factual" | "Educational" => 0x90,
        "Nature/Animals/Environment" | "Science/Nature" => 0x91,
        "Technology/Natural Sciences" => 0x92,
        "Medicine/Physiology/Psychology" => 0x93,
        "Foreign Countries/Expeditions" => 0x94,
        "Social/Spiritual Sciences" => 0x95,
        "Further Education" => 0x96,
        "Languages" => 0x97,

        // Leisure/Hobbies
        "Leisure/Hobbies" => 0xA0,
        "Tourism/Travel" => 0xA1,
        "Handicraft" => 0xA2,
        "Motoring" => 0xA3,
        "Fitness & Health" | "Aerobics" => 0xA4,
        "Cooking" => 0xA5,
        "Advertisement/Shopping" => 0xA6,
        "Gardening" => 0xA7,

        // Special characteristics
        "Original Language" => 0xB1,
        "Black & White" => 0xB2,
        "Unpublished" => 0xB3,
        "Live Broadcast" => 0xB4,

        "Unknown" => 0x00,

        _ => return None,
    };

    Some(code)
}

/// Returns the minimum age for a US TV parental guideline, 0 when unrated or unknown.
pub fn rating_code(rating: Option<&str>) -> u8 {
    match rating {
        Some("TV-Y") => 2,
        Some("TV-Y7") => 7,
        Some("TV-G") => 8,
        Some("TV-PG") => 10,
        Some("TV-14") => 14,
        Some("TV-MA") => 18,
        _ => 0,
    }
}
