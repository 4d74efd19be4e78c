//! Streaming reads and writes through the spool-backed bridges.

use std::io::SeekFrom;
use std::sync::atomic::Ordering;
use std::time::Duration;

use sha2::{Digest, Sha256};

use super::{faulty_fs, key_exists, new_fs, new_fs_with, put_key, random_bytes};
use crate::{Config, Error, Fs, MIN_PART_SIZE, Result};

async fn round_trip(fs: &Fs, path: &str, len: usize) -> Result<()> {
    let data = random_bytes(len);

    let mut file = fs.create(path).await?;
    // Uneven writes so chunk boundaries never line up with parts.
    for chunk in data.chunks(777_777) {
        assert_eq!(file.write(chunk).await?, chunk.len());
    }
    file.close().await?;
    assert_eq!(file.info().size(), len as u64);

    let info = fs.stat(path).await?;
    assert_eq!(info.size(), len as u64);

    let back = fs.read_to_vec(path).await?;
    assert_eq!(back.len(), len);
    assert!(back == data, "content mismatch for {len} bytes");
    Ok(())
}

#[tokio::test]
async fn test_round_trip_small() -> Result<()> {
    let fs = new_fs();
    round_trip(&fs, "empty", 0).await?;
    round_trip(&fs, "one", 1).await?;
    round_trip(&fs, "dir/small", 4096).await
}

#[tokio::test]
async fn test_round_trip_multiple_parts() -> Result<()> {
    let scratch = tempfile::tempdir()?;
    let fs = new_fs_with(Config::new().with_scratch_dir(scratch.path()));
    round_trip(&fs, "big/blob.bin", 2 * MIN_PART_SIZE + 12345).await
}

#[tokio::test]
async fn test_create_replaces_file() -> Result<()> {
    let fs = new_fs();
    _ = fs.write_from_slice("f.txt", b"old contents").await?;
    let info = fs.write_from_slice("f.txt", b"new").await?;
    assert_eq!(info.size(), 3);
    assert_eq!(info.name(), "f.txt");
    assert_eq!(fs.read_to_vec("f.txt").await?, b"new");
    Ok(())
}

#[tokio::test]
async fn test_create_over_directory_fails() -> Result<()> {
    let fs = new_fs();
    _ = fs.make_directory("d").await?;

    let err = fs.create("d").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(ref p) if p == "d"));
    let err = fs.create("/").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    Ok(())
}

#[tokio::test]
async fn test_open_missing_fails() -> Result<()> {
    let fs = new_fs();
    let err = fs.open("nothing/here").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref p) if p == "nothing/here"));
    Ok(())
}

#[tokio::test]
async fn test_seek_and_read() -> Result<()> {
    let fs = new_fs();
    put_key(&fs, "digits", b"0123456789").await;
    let mut file = fs.open("digits").await?.into_file()?;
    assert_eq!(file.info().size(), 10);

    let mut buf = [0u8; 3];
    assert_eq!(file.seek(SeekFrom::Start(4))?, 4);
    assert_eq!(file.read(&mut buf).await?, 3);
    assert_eq!(&buf, b"456");

    assert_eq!(file.seek(SeekFrom::Current(-2))?, 5);
    assert_eq!(file.read_to_end().await?, b"56789");
    assert_eq!(file.position(), 10);

    assert_eq!(file.seek(SeekFrom::End(-1))?, 9);
    assert_eq!(file.read_to_end().await?, b"9");

    assert_eq!(file.seek(SeekFrom::End(0))?, 10);
    assert_eq!(file.read(&mut buf).await?, 0);

    file.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_seek_out_of_range_is_invalid() -> Result<()> {
    let (fs, faults) = faulty_fs(Config::default());
    put_key(&fs, "ten", b"0123456789").await;
    let mut file = fs.open("ten").await?.into_file()?;

    let mut first = [0u8; 2];
    assert_eq!(file.read(&mut first).await?, 2);
    let gets = faults.gets.load(Ordering::SeqCst);

    for pos in [SeekFrom::End(1), SeekFrom::Current(-3), SeekFrom::Start(11)] {
        let err = file.seek(pos).unwrap_err();
        assert!(matches!(err, Error::Invalid { .. }), "{pos:?}");
    }
    // A seek to the current offset keeps the running transfer.
    assert_eq!(file.seek(SeekFrom::Current(0))?, 2);
    assert_eq!(faults.gets.load(Ordering::SeqCst), gets);

    let mut rest = [0u8; 8];
    assert_eq!(file.read(&mut rest).await?, 8);
    assert_eq!(&rest, b"23456789");
    Ok(())
}

#[tokio::test]
async fn test_read_at() -> Result<()> {
    let fs = new_fs();
    let data = random_bytes(100_000);
    _ = fs.write_from_slice("data.bin", &data).await?;
    let mut file = fs.open("data.bin").await?.into_file()?;

    let mut buf = vec![0u8; 1000];
    assert_eq!(file.read_at(&mut buf, 50_000).await?, 1000);
    assert_eq!(buf, &data[50_000..51_000]);
    assert_eq!(file.position(), 51_000);

    assert_eq!(file.read_at(&mut buf, 10).await?, 1000);
    assert_eq!(buf, &data[10..1010]);

    // Short at the end, then nothing past it.
    assert_eq!(file.read_at(&mut buf, 99_500).await?, 500);
    assert_eq!(&buf[..500], &data[99_500..]);
    assert_eq!(file.read_at(&mut buf, 100_000).await?, 0);
    assert_eq!(file.read_at(&mut buf, 200_000).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_parallel_ranged_reads_match_sequential() -> Result<()> {
    let fs = new_fs();
    let len = 3 * 1024 * 1024 + 17;
    _ = fs.write_from_slice("large.bin", &random_bytes(len)).await?;

    let whole = Sha256::digest(fs.read_to_vec("large.bin").await?);

    let parts = 4;
    let span = len.div_ceil(parts);
    let mut tasks = Vec::new();
    for i in 0..parts {
        let fs = fs.clone();
        tasks.push(tokio::spawn(async move {
            let start = i * span;
            let mut buf = vec![0u8; span.min(len - start)];
            let mut file = fs.open("large.bin").await?.into_file()?;
            let n = file.read_at(&mut buf, start as u64).await?;
            buf.truncate(n);
            file.close().await?;
            Ok::<_, Error>(buf)
        }));
    }

    let mut hasher = Sha256::new();
    for task in tasks {
        hasher.update(task.await.unwrap()?);
    }
    assert_eq!(hasher.finalize(), whole);
    Ok(())
}

#[tokio::test]
async fn test_handle_modes() -> Result<()> {
    let fs = new_fs();
    let mut writer = fs.create("m.txt").await?;
    let mut buf = [0u8; 4];
    assert!(matches!(
        writer.read(&mut buf).await,
        Err(Error::NotOpen { op: "reading", .. })
    ));
    assert!(writer.seek(SeekFrom::Start(0)).is_err());
    _ = writer.write(b"abc").await?;
    writer.close().await?;
    writer.close().await?;
    assert!(matches!(
        writer.write(b"more").await,
        Err(Error::NotOpen { op: "writing", .. })
    ));

    let mut reader = fs.open("m.txt").await?.into_file()?;
    assert!(matches!(
        reader.write(b"x").await,
        Err(Error::NotOpen { op: "writing", .. })
    ));
    reader.close().await?;
    reader.close().await?;
    assert!(matches!(
        reader.read(&mut buf).await,
        Err(Error::NotOpen { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_write_at_must_be_sequential() -> Result<()> {
    let fs = new_fs();
    let mut file = fs.create("seq").await?;
    assert_eq!(file.write_at(b"abc", 0).await?, 3);
    assert_eq!(file.write_at(b"def", 3).await?, 3);

    let err = file.write_at(b"zzz", 1).await.unwrap_err();
    assert!(matches!(err, Error::Invalid { .. }));
    let err = file.write_at(b"zzz", 100).await.unwrap_err();
    assert!(matches!(err, Error::Invalid { .. }));

    file.close().await?;
    assert_eq!(fs.read_to_vec("seq").await?, b"abcdef");
    Ok(())
}

#[tokio::test]
async fn test_dropped_writer_never_commits() -> Result<()> {
    let fs = new_fs();
    {
        let mut file = fs.create("abandoned").await?;
        _ = file.write(b"half written").await?;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(fs.stat("abandoned").await.unwrap_err().is_not_found());
    assert!(!key_exists(&fs, "abandoned").await);
    Ok(())
}

#[tokio::test]
async fn test_upload_failure_surfaces_on_close() -> Result<()> {
    let (fs, faults) = faulty_fs(Config::default());
    faults.fail_upload.store(true, Ordering::SeqCst);

    let mut file = fs.create("doomed").await?;
    if let Err(err) = file.write(b"payload").await {
        assert!(matches!(err, Error::Store(_)), "{err:?}");
    }
    assert!(file.close().await.is_err());
    // Retrying close repeats the failure.
    assert!(file.close().await.is_err());
    assert!(!key_exists(&fs, "doomed").await);
    Ok(())
}

#[tokio::test]
async fn test_read_failure_is_not_truncation() -> Result<()> {
    let (fs, faults) = faulty_fs(Config::default());
    put_key(&fs, "flaky", &random_bytes(10_000)).await;
    faults.fail_get.store(true, Ordering::SeqCst);

    let mut file = fs.open("flaky").await?.into_file()?;
    let err = file.read_to_end().await.unwrap_err();
    assert!(matches!(err, Error::Store(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn test_write_blocks_when_spool_is_full() -> Result<()> {
    let (fs, faults) = faulty_fs(Config::default());
    faults.hold_upload.store(true, Ordering::SeqCst);
    let capacity = fs.config().spool_capacity();

    let mut file = fs.create("held").await?;
    let data = random_bytes(capacity + 1);
    let blocked = tokio::time::timeout(Duration::from_millis(300), file.write(&data)).await;
    assert!(blocked.is_err(), "write beyond the spool must wait for the upload");

    // The abandoned write still accounts for what reached the spool.
    assert_eq!(file.position(), capacity as u64);
    let err = file.write_at(&data[capacity..], 0).await.unwrap_err();
    assert!(matches!(err, Error::Invalid { .. }));

    faults.release.notify_one();
    _ = file.write_at(&data[capacity..], capacity as u64).await?;
    file.close().await?;
    assert_eq!(file.info().size(), data.len() as u64);

    let stored = fs.read_to_vec("held").await?;
    assert_eq!(Sha256::digest(&stored), Sha256::digest(&data));
    Ok(())
}
