use std::io::Write;

use xyzimage::{Error, PaletteEntry, PixelFormat, XyzImage};

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn gradient(width: u16, height: u16) -> XyzImage {
    let mut image = XyzImage::new(width, height, PixelFormat::Indexed8).unwrap();

    for (i, entry) in image.palette_mut().unwrap().entries_mut().iter_mut().enumerate() {
        *entry = PaletteEntry::new(i as u8, 255 - i as u8, (i / 2) as u8);
    }
    for (i, pixel) in image.bitmap_mut().iter_mut().enumerate() {
        *pixel = (i % 256) as u8;
    }

    image
}

#[test]
fn save_and_open() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("gradient.xyz");

    let mut image = gradient(320, 240);
    image.save(&path)?;

    let on_disk = std::fs::metadata(&path)?.len() as usize;
    assert_eq!(on_disk, image.compressed_file_size());
    assert!(on_disk < image.file_size());

    let loaded = xyzimage::open(&path)?;
    assert_eq!(loaded.width(), 320);
    assert_eq!(loaded.height(), 240);
    assert_eq!(loaded.pixel_format(), PixelFormat::Indexed8);
    assert_eq!(loaded.bitmap(), image.bitmap());
    assert_eq!(loaded.palette(), image.palette());
    assert_eq!(loaded.compressed_file_size(), on_disk);

    Ok(())
}

#[test]
fn open_rejects_other_files() -> STDRESULT {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(b"\x89PNG\r\n\x1a\n")?;
    file.flush()?;

    match xyzimage::open(file.path()) {
        Err(Error::InvalidIdentifier(magic)) => assert_eq!(&magic, b"\x89PNG"),
        other => panic!("expected invalid identifier, got {other:?}"),
    }

    Ok(())
}

#[test]
fn open_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        xyzimage::open(temp_dir.path().join("missing.xyz")),
        Err(Error::Io(_))
    ));
}

#[test]
fn in_memory_round_trip() -> STDRESULT {
    let mut image = gradient(7, 3);

    let mut buffer = Vec::new();
    image.encode(&mut buffer)?;

    let decoded = XyzImage::decode(&mut buffer.as_slice())?;
    assert_eq!(decoded.bitmap(), image.bitmap());
    assert_eq!(decoded.palette(), image.palette());

    Ok(())
}
