use super::{ChipSet, NsfError, NsfFile};

fn build_image(load_address: u16, program: &[u8]) -> Vec<u8> {
    let mut data = vec![0; 0x80];
    data[..5].copy_from_slice(b"NESM\x1A");
    data[0x6] = 3; // songs
    data[0x7] = 2; // start song
    data[0x8..0xA].copy_from_slice(&load_address.to_le_bytes());
    data[0xA..0xC].copy_from_slice(&0x8000u16.to_le_bytes());
    data[0xC..0xE].copy_from_slice(&0x8003u16.to_le_bytes());
    data[0x0E..0x0E + 9].copy_from_slice(b"Test Song");
    data[0x2E..0x2E + 8].copy_from_slice(b"Somebody");
    data[0x4E..0x4E + 4].copy_from_slice(b"2001");
    data.extend_from_slice(program);

    data
}

#[test]
fn rejects_bad_magic() {
    let mut data = build_image(0x8000, &[1, 2, 3]);
    data[3] = b'X';

    assert!(matches!(
        NsfFile::from_bytes(&data),
        Err(NsfError::InvalidMagic)
    ));
}

#[test]
fn rejects_truncated_header() {
    let data = b"NESM\x1A too short".to_vec();

    assert!(matches!(
        NsfFile::from_bytes(&data),
        Err(NsfError::TruncatedHeader)
    ));
}

#[test]
fn parses_header_fields() {
    let file = NsfFile::from_bytes(&build_image(0x8000, &[0; 16])).unwrap();

    assert_eq!(file.songs_count(), 3);
    assert_eq!(file.start_song(), 2);
    assert_eq!(file.init_address(), 0x8000);
    assert_eq!(file.play_address(), 0x8003);
    assert_eq!(file.name(), "Test Song");
    assert_eq!(file.artist(), "Somebody");
    assert_eq!(file.copyright(), "2001");
    assert_eq!(file.chips(), ChipSet::empty());
}

#[test]
fn parses_expansion_chip_bitmask() {
    let mut data = build_image(0x8000, &[0; 16]);
    data[0x7B] = 0b0010_0001; // VRC6 + Sunsoft 5B

    let file = NsfFile::from_bytes(&data).unwrap();
    assert_eq!(file.chips(), ChipSet::VRC6 | ChipSet::SUNSOFT_5B);
}

#[test]
fn reads_program_through_the_default_banks() {
    let mut program = vec![0; 0x2000];
    program[0] = 0xAB;
    program[0x1234] = 0xCD;

    let file = NsfFile::from_bytes(&build_image(0x8000, &program)).unwrap();

    assert_eq!(file.read(0x8000), 0xAB);
    assert_eq!(file.read(0x9234), 0xCD);
    // past the program everything is zero
    assert_eq!(file.read(0xFFFF), 0);
}

#[test]
fn load_address_offsets_the_first_bank() {
    let file = NsfFile::from_bytes(&build_image(0x8010, &[0xAB, 0xCD])).unwrap();

    // the unfilled prefix of the first bank stays zero
    assert_eq!(file.read(0x8000), 0);
    assert_eq!(file.read(0x800F), 0);
    assert_eq!(file.read(0x8010), 0xAB);
    assert_eq!(file.read(0x8011), 0xCD);
}

#[test]
fn bank_overrides_select_initial_banks() {
    let mut program = vec![0; 0x2000];
    program[0x1000] = 0x42; // bank 1

    let mut data = build_image(0x8000, &program);
    data[0x70] = 1; // window 0 starts on bank 1

    let file = NsfFile::from_bytes(&data).unwrap();
    assert_eq!(file.read(0x8000), 0x42);
}

#[test]
fn switch_bank_only_listens_to_its_register_window() {
    let mut program = vec![0; 0x2000];
    program[0x1000] = 0x42;

    let mut file = NsfFile::from_bytes(&build_image(0x8000, &program)).unwrap();

    file.switch_bank(0x5FF0, 1);
    assert_eq!(file.read(0x8000), 0);

    file.switch_bank(0x5FF8, 1);
    assert_eq!(file.read(0x8000), 0x42);

    // out-of-range bank numbers read as zero instead of crashing
    file.switch_bank(0x5FF8, 200);
    assert_eq!(file.read(0x8000), 0);
}

#[test]
fn reset_banks_restores_the_header_defaults() {
    let mut file = NsfFile::from_bytes(&build_image(0x8000, &[0; 0x2000])).unwrap();

    file.switch_bank(0x5FF8, 7);
    assert_eq!(file.bank_select()[0], 7);

    file.reset_banks();
    assert_eq!(file.bank_select()[0], 0);
}

#[test]
fn two_byte_reads_are_little_endian_across_banks() {
    let mut program = vec![0; 0x2000];
    program[0x0FFF] = 0x34; // end of bank 0
    program[0x1000] = 0x12; // start of bank 1

    let file = NsfFile::from_bytes(&build_image(0x8000, &program)).unwrap();

    assert_eq!(file.read_u16(0x8FFF), 0x1234);
}
