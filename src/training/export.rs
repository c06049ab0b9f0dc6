//! Export of a selection to its target: clean the destination, copy the
//! songs over, write an m3u playlist and bump play counts.

use super::config::ResolvedTarget;
use super::ordering::RankedSong;
use crate::models::Song;
use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fs;
use std::path::{Path, PathBuf};

/// File types removed from the destination when `clean_target` is set
pub const SONG_EXTENSIONS: [&str; 7] = ["mp3", "mp4", "flac", "wav", "ogg", "wma", "m3u"];

/// Where exported songs come from and where plays are recorded
#[cfg_attr(test, mockall::automock)]
pub trait MediaSource {
    /// Write the audio file of `song` to `destination`
    fn fetch_to(&self, song: &Song, destination: &Path) -> Result<()>;

    /// Record one more play of `song`
    fn increment_play_count(&self, song: &Song) -> Result<()>;
}

/// What an export did (or would have done on a dry run)
#[derive(Debug, Default)]
pub struct ExportReport {
    pub deleted: Vec<PathBuf>,
    /// File names written to the destination, in playlist order
    pub exported: Vec<String>,
    /// Songs that could not be fetched
    pub failed: Vec<String>,
    pub playlist: Option<PathBuf>,
}

pub struct TrainingExport<'a, S: MediaSource + ?Sized> {
    training_name: &'a str,
    target: &'a ResolvedTarget,
    source: &'a S,
    increment_play_count: bool,
    dry_run: bool,
}

impl<'a, S: MediaSource + ?Sized> TrainingExport<'a, S> {
    pub fn new(training_name: &'a str, target: &'a ResolvedTarget, source: &'a S) -> Self {
        Self {
            training_name,
            target,
            source,
            increment_play_count: false,
            dry_run: false,
        }
    }

    pub fn increment_play_count(mut self, increment: bool) -> Self {
        self.increment_play_count = increment;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn export(&self, songs: &[RankedSong]) -> Result<ExportReport> {
        let destination = self.target.destination_path()?;
        let mut report = ExportReport::default();

        self.clean_target(&destination, &mut report)?;
        self.copy_items(&destination, songs, &mut report);
        self.generate_playlist(&destination, &mut report)?;

        Ok(report)
    }

    fn clean_target(&self, destination: &Path, report: &mut ExportReport) -> Result<()> {
        if self.target.clean_target {
            println!(
                "Cleaning target[{}]: {}",
                self.target.name,
                destination.display()
            );

            let entries = fs::read_dir(destination)
                .with_context(|| format!("Cannot list {}", destination.display()))?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && has_song_extension(path))
                .collect();
            files.sort();

            for file in files {
                self.delete(file, report)?;
            }
        }

        if self.target.delete_from_device.is_empty() {
            return Ok(());
        }

        let Some(root) = self.target.root_path() else {
            return Ok(());
        };
        println!(
            "Deleting additional files: {:?}",
            self.target.delete_from_device
        );

        for relative in &self.target.delete_from_device {
            let path = root.join(relative.trim_matches('/'));
            if !path.is_file() {
                debug!("The file to delete does not exist: {relative}");
                continue;
            }
            self.delete(path, report)?;
        }

        Ok(())
    }

    fn delete(&self, path: PathBuf, report: &mut ExportReport) -> Result<()> {
        info!("Deleting: {}", path.display());
        if !self.dry_run {
            fs::remove_file(&path).with_context(|| format!("Cannot delete {}", path.display()))?;
        }
        report.deleted.push(path);
        Ok(())
    }

    fn copy_items(&self, destination: &Path, songs: &[RankedSong], report: &mut ExportReport) {
        if !self.target.copy_files {
            println!(
                "Copying to target[{}] was skipped (copy_files=no).",
                self.target.name
            );
            return;
        }

        println!(
            "Copying to target[{}]: {}",
            self.target.name,
            destination.display()
        );

        let mut rng = rand::thread_rng();
        let mut cnt = 0;
        for ranked in songs {
            let song = &ranked.song;
            let file_name = export_file_name(cnt, &random_string(&mut rng, 6), song);
            info!("Copying[{file_name}]: {} - {}", song.artist, song.title);

            if !self.dry_run {
                if let Err(e) = self.source.fetch_to(song, &destination.join(&file_name)) {
                    warn!("Cannot fetch '{}' ({}): {e:#}", song.title, song.id);
                    eprintln!("Song could not be copied: {} ({e})", song.title);
                    report.failed.push(song.id.clone());
                    continue;
                }

                if self.increment_play_count {
                    if let Err(e) = self.source.increment_play_count(song) {
                        warn!("Cannot increment play count of '{}': {e:#}", song.title);
                    }
                }

                report.exported.push(file_name);
            }
            cnt += 1;
        }
    }

    fn generate_playlist(&self, destination: &Path, report: &mut ExportReport) -> Result<()> {
        if !self.target.generate_playlist {
            println!(
                "Playlist generation to target[{}] was skipped (generate_playlist=no).",
                self.target.name
            );
            return Ok(());
        }

        let playlist_path = destination.join(format!("{}.m3u", self.training_name));
        if self.dry_run {
            info!("Would create playlist: {}", playlist_path.display());
            return Ok(());
        }

        let mut lines = vec![format!(
            "# Playlist generated for training '{}' on {}",
            self.training_name,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )];
        lines.extend(report.exported.iter().cloned());

        fs::write(&playlist_path, lines.join("\n") + "\n")
            .with_context(|| format!("Cannot write playlist {}", playlist_path.display()))?;
        info!("Created playlist: {}", playlist_path.display());

        report.playlist = Some(playlist_path);
        Ok(())
    }
}

fn has_song_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SONG_EXTENSIONS.contains(&ext.as_str()))
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// `000007_a1B2c3.flac`: export position, random tag, original extension
pub fn export_file_name(position: usize, tag: &str, song: &Song) -> String {
    format!("{position:06}_{tag}.{}", song.file_extension())
}
