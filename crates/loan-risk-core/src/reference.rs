//! Shipped regional reference tables.
//!
//! These are the defaults behind [`crate::master::MasterData::builtin`]. A
//! deployment with a different branch network supplies its own
//! [`crate::master::MasterConfig`] instead.

use crate::segmentation::Segment;

/// Branch offices: `(code, display name)`.
pub const BRANCHES: &[(u32, &str)] = &[
    (5, "KC Bandung AA"),
    (25, "KC Garut"),
    (28, "KC Indramayu"),
    (46, "KC Majalengka"),
    (75, "KC Purwakarta"),
    (92, "KC Sukabumi"),
    (94, "KC Sumedang"),
    (100, "KC Tasikmalaya"),
    (104, "KC Ciamis"),
    (105, "KC Cianjur"),
    (107, "KC Cirebon Kartini"),
    (123, "KC Subang"),
    (132, "KC Majalaya"),
    (133, "KC Kuningan"),
    (137, "KC Cimahi"),
    (161, "KC Singaparna"),
    (162, "KC Banjar"),
    (165, "KC Jatibarang"),
    (181, "KC Cibadak"),
    (286, "KC Bandung Dewi Sartika"),
    (337, "KC Bandung Naripan"),
    (354, "KC Bandung A.H. Nasution"),
    (355, "KC Pamanukan"),
    (389, "KC Bandung Martadinata"),
    (401, "KC Bandung Kopo"),
    (405, "KC Bandung Dago"),
    (406, "KC Cirebon Gunung Jati"),
    (407, "KC Bandung Sukarno Hatta"),
    (408, "KC Bandung Setiabudi"),
    (544, "KC Soreang"),
];

/// Sub-branch offices: `(code, display name, owning branch code)`.
pub const SUB_BRANCHES: &[(u32, &str, u32)] = &[
    (675, "KCP Rajawali Bandung", 5),
    (1345, "KCP Guntur", 25),
    (1346, "KCP Cikajang", 25),
    (599, "KCP Patrol", 28),
    (1108, "KCP Abdul Fatah", 46),
    (2162, "KCP Pasar Pelita", 92),
    (2229, "KCP Surade", 92),
    (598, "KCP Jatinangor", 94),
    (1337, "KCP Cikurubuk", 100),
    (1437, "KCP Ciawi Tasikmalaya", 100),
    (517, "KCP Cipanas", 105),
    (2230, "KCP Ciranjang", 105),
    (2231, "KCP Sukanagara", 105),
    (601, "KCP Weru", 107),
    (1139, "KCP Rancaekek", 132),
    (656, "KCP Padalarang", 133),
    (1070, "KCP Cijerah", 137),
    (1071, "KCP Cimindi", 137),
    (542, "KCP Pangandaran", 162),
    (543, "KCP Pelabuhan Ratu", 181),
    (1355, "KCP Cicurug", 181),
    (650, "KCP Otto Iskandardinata", 181),
    (1077, "KCP Peta", 286),
    (1596, "KCP Telkom Bandung", 286),
    (2202, "KCP Kosambi Bandung", 286),
    (1141, "KCP Simpang Buah Batu", 337),
    (2105, "KCP Suci", 354),
    (2104, "KCP Riau", 389),
    (600, "KCP Sumber Sari", 401),
    (2103, "KCP Mekarwangi", 401),
    (2155, "KCP Taman Kopo Indah", 401),
    (2184, "KCP Taman Kopo Indah II", 401),
    (593, "KCP ITB", 405),
    (1078, "KCP Sumber", 406),
    (2128, "KCP Ciledug Cirebon", 406),
    (1107, "KCP Metro Trade Center", 407),
    (2058, "KCP Batununggal", 407),
    (2154, "KCP Antapani", 407),
    (655, "KCP Setrasari", 408),
    (2000, "KCP Cihampelas", 408),
    (2016, "KCP Lembang", 408),
    (1140, "KCP Banjaran", 544),
];

/// Product classification codes per leaf segment, each with its product
/// description.
pub const SEGMENT_CODES: &[(Segment, &[(&str, &str)])] = &[
    (
        Segment::Medium,
        &[
            ("42210", "10. RITKOM -> Rp. 5 M S/D 15 M"),
            ("42211", "11. RITKOM -> Rp. 15 M S/D 25 M"),
            ("43210", "(PRT) 05. RITKOM -> Rp. 5 M S/D 15 M"),
            ("43211", "(PRT) 06. RITKOM -> Rp. 15 M S/D 25 M"),
        ],
    ),
    (
        Segment::SmallNcc,
        &[
            ("43206", "(PRT) 01. RITKOM - > Rp 1 M S/D Rp 2 M"),
            ("43207", "(PRT) 02. RITKOM - > Rp 2 M S/D Rp 3 M"),
            ("43208", "(PRT) 03. RITKOM - > Rp 3 M S/D Rp 4 M"),
            ("43209", "(PRT) 04. RITKOM - > Rp 4 M S/D Rp 5 M"),
            ("82201", "01. KECIL - S/D Rp 50 JUTA"),
            ("82202", "02. KECIL - > Rp.50 JUTA S/D Rp 100 JUTA"),
            ("82203", "03. KECIL - > Rp 100 JUTA S/D Rp 350 JUTA"),
            ("42203", "03. RITKOM - > Rp 100 JUTA S/D Rp 350 JUTA"),
            ("82204", "04. KECIL - > Rp 350 JUTA S/D Rp 500 JUTA"),
            ("42204", "04. RITKOM - > Rp 350 JUTA S/D Rp 500 JUTA"),
            ("82205", "05. KECIL - > Rp 500 JUTA S/D Rp 1 M"),
            ("42205", "05. RITKOM - > Rp 500 JUTA S/D Rp 1 M"),
            ("42206", "06. RITKOM - > Rp 1 M S/D Rp 2 M"),
            ("42207", "07. RITKOM - > Rp 2 M S/D Rp 3 M"),
            ("42208", "08. RITKOM - > Rp 3 M S/D Rp 4 M"),
            ("42209", "09. RITKOM - > Rp 4 M S/D Rp 5 M"),
            ("80064", "KREDIT PANGAN"),
        ],
    ),
    (
        Segment::Cc,
        &[
            ("42110", "RITKOM - CASHCOL RITEL (> Rp 1 M S/D Rp 25 M)"),
            ("42120", "RITKOM - CASHCOL MENENGAH (> Rp 25 M S/D Rp 200 M)"),
            ("42140", "RITKOM - CASHCOL KECIL (S/D Rp 1 M)"),
        ],
    ),
    (Segment::Kur, &[("80065", "10. KUR Ritel 2015 New")]),
];

/// Description-keyed segment table used by older uploads. It predates the
/// `SMALL NCC` split: `SMALL` lists every small-ticket description, CC and KUR
/// included. Lookup takes the first segment, in this order, that lists a
/// description.
pub const LEGACY_SEGMENT_DESCRIPTIONS: &[(Segment, &[&str])] = &[
    (
        Segment::Cc,
        &[
            "RITKOM - CASHCOL RITEL (> Rp 1 M S/D Rp 25 M)",
            "RITKOM - CASHCOL MENENGAH (> Rp 25 M S/D Rp 200 M)",
            "RITKOM - CASHCOL KECIL (S/D Rp 1 M)",
        ],
    ),
    (
        Segment::Small,
        &[
            "(PRT) 01. RITKOM - > Rp 1 M S/D Rp 2 M",
            "(PRT) 02. RITKOM - > Rp 2 M S/D Rp 3 M",
            "(PRT) 03. RITKOM - > Rp 3 M S/D Rp 4 M",
            "(PRT) 04. RITKOM - > Rp 4 M S/D Rp 5 M",
            "01. KECIL - S/D Rp 50 JUTA",
            "02. KECIL - > Rp.50 JUTA S/D Rp 100 JUTA",
            "03. KECIL - > Rp 100 JUTA S/D Rp 350 JUTA",
            "03. RITKOM - > Rp 100 JUTA S/D Rp 350 JUTA",
            "04. KECIL - > Rp 350 JUTA S/D Rp 500 JUTA",
            "04. RITKOM - > Rp 350 JUTA S/D Rp 500 JUTA",
            "05. KECIL - > Rp 500 JUTA S/D Rp 1 M",
            "05. RITKOM - > Rp 500 JUTA S/D Rp 1 M",
            "06. RITKOM - > Rp 1 M S/D Rp 2 M",
            "07. RITKOM - > Rp 2 M S/D Rp 3 M",
            "08. RITKOM - > Rp 3 M S/D Rp 4 M",
            "09. RITKOM - > Rp 4 M S/D Rp 5 M",
            "KREDIT PANGAN",
            "RITKOM - CASHCOL RITEL (> Rp 1 M S/D Rp 25 M)",
            "RITKOM - CASHCOL MENENGAH (> Rp 25 M S/D Rp 200 M)",
            "RITKOM - CASHCOL KECIL (S/D Rp 1 M)",
            "10. KUR Ritel 2015 New",
        ],
    ),
    (
        Segment::Medium,
        &[
            "10. RITKOM -> Rp. 5 M S/D 15 M",
            "11. RITKOM -> Rp. 15 M S/D 25 M",
            "(PRT) 05. RITKOM -> Rp. 5 M S/D 15 M",
            "(PRT) 06. RITKOM -> Rp. 15 M S/D 25 M",
        ],
    ),
    (Segment::Kur, &["10. KUR Ritel 2015 New"]),
];
