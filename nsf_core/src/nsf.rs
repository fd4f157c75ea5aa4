use crate::apu::Apu;
use crate::common::save_state::{Savable, SaveError};
use crate::common::CPU_CLOCKS_PER_FRAME;
use crate::cpu6502::{CPUBusTrait, CpuError, CPU6502};
use crate::nsf_file::{ChipSet, NsfError, NsfFile};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    fs::File,
    io::{Read, Write},
    path::Path,
    rc::Rc,
};

pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// The two JSR call stubs the driver plants in work RAM. Playback enters
/// the init stub once per track and the play stub once per frame; returning
/// from either parks the processor until the next frame.
const PLAY_STUB_ADDRESS: u16 = 0x3800;
const INIT_STUB_ADDRESS: u16 = 0x3803;
const JSR_OPCODE: u8 = 0x20;

const RAM_SIZE: usize = 0x4000;

struct CpuBus {
    ram: [u8; RAM_SIZE],
    file: Rc<RefCell<NsfFile>>,
    apu: Apu,
}

impl CpuBus {
    fn new(file: Rc<RefCell<NsfFile>>, apu: Apu) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            file,
            apu,
        }
    }

    fn install_driver_stubs(&mut self, play_address: u16, init_address: u16) {
        let stubs = [
            JSR_OPCODE,
            play_address as u8,
            (play_address >> 8) as u8,
            JSR_OPCODE,
            init_address as u8,
            (init_address >> 8) as u8,
        ];

        let start = PLAY_STUB_ADDRESS as usize;
        self.ram[start..start + stubs.len()].copy_from_slice(&stubs);
    }
}

impl CPUBusTrait for CpuBus {
    fn read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x3FFF => self.ram[address as usize],
            0x4000..=0x7FFF => 0,
            0x8000..=0xFFFF => self.file.borrow().read(address),
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        match address {
            0x0000..=0x1FFF => self.ram[address as usize] = data,
            0x4000..=0x4017 => self.apu.write_register(address, data),
            0x5FF8..=0x5FFF => self.file.borrow_mut().switch_bank(address, data),
            0x8000..=0xFFFF => self.apu.write_expansion_register(address, data),
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.ram = [0; RAM_SIZE];
    }
}

impl Savable for CpuBus {
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        writer.write_all(&self.ram)?;
        self.apu.save(writer)?;

        Ok(())
    }

    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), SaveError> {
        reader.read_exact(&mut self.ram)?;
        self.apu.load(reader)?;

        Ok(())
    }
}

/// A playable NSF machine: the instruction processor wired to work RAM, the
/// APU and the bank-switched image, plus the sample clock that turns
/// instruction clocks into a fixed-rate sample stream.
pub struct NSF {
    file: Rc<RefCell<NsfFile>>,
    cpu: CPU6502<CpuBus>,

    playing: bool,
    now_playing: u8,
    /// set once the init/play routine has returned at least once, from then
    /// on every frame re-enters the play stub
    frame_routine_done: bool,

    /// CPU clocks owed to the next output sample
    sample_clock: f64,
    /// CPU clocks into the current frame
    frame_clock: f64,
    clocks_per_sample: f64,
}

impl NSF {
    pub fn from_bytes(data: &[u8], sample_rate: u32) -> Result<Self, NsfError> {
        let file = Rc::new(RefCell::new(NsfFile::from_bytes(data)?));

        let apu = Apu::new(file.clone(), file.borrow().chips());
        let bus = CpuBus::new(file.clone(), apu);

        let mut cpu = CPU6502::new(bus);
        cpu.reset();

        Ok(Self {
            file,
            cpu,

            playing: false,
            now_playing: 0,
            frame_routine_done: false,

            sample_clock: 0.,
            frame_clock: 0.,
            clocks_per_sample: CPU_CLOCKS_PER_FRAME * 60. / sample_rate as f64,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self, NsfError> {
        let mut data = Vec::new();
        File::open(path)?.read_to_end(&mut data)?;

        Self::from_bytes(&data, sample_rate)
    }

    /// Start the given 1-based track, out-of-range selections are clamped to
    /// the valid range. This is a full logical reset of the machine.
    pub fn play(&mut self, song: u8) {
        let songs_count = self.file.borrow().songs_count();
        let song = song.clamp(1, songs_count.max(1));

        self.reset();

        let (play_address, init_address) = {
            let file = self.file.borrow();
            (file.play_address(), file.init_address())
        };
        self.cpu
            .bus_mut()
            .install_driver_stubs(play_address, init_address);

        self.now_playing = song;

        // the init routine receives the 0-based track in A
        self.cpu.set_register_a(song - 1);
        self.cpu.set_pc(INIT_STUB_ADDRESS);

        self.playing = true;
    }

    /// Start the track the header marks as the first one.
    pub fn play_start_song(&mut self) {
        let start_song = self.file.borrow().start_song();

        self.play(start_song.max(1));
    }

    pub fn next_track(&mut self) {
        self.play(self.now_playing.saturating_add(1));
    }

    pub fn prev_track(&mut self) {
        self.play(self.now_playing.saturating_sub(1));
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_song(&self) -> u8 {
        self.now_playing
    }

    pub fn songs_count(&self) -> u8 {
        self.file.borrow().songs_count()
    }

    pub fn name(&self) -> String {
        self.file.borrow().name().to_owned()
    }

    pub fn artist(&self) -> String {
        self.file.borrow().artist().to_owned()
    }

    pub fn copyright(&self) -> String {
        self.file.borrow().copyright().to_owned()
    }

    pub fn chips(&self) -> ChipSet {
        self.file.borrow().chips()
    }

    /// Run the machine until one output sample is due and return it. While
    /// the play flag is dropped this returns silence without touching any
    /// state.
    pub fn next_sample(&mut self) -> Result<f32, CpuError> {
        if !self.playing {
            return Ok(0.);
        }

        while self.sample_clock < self.clocks_per_sample {
            let cycles = self.cpu.execute_next()? as u32;
            let stolen_cycles = self.cpu.bus_mut().apu.clock(cycles);

            let elapsed = (cycles + stolen_cycles) as f64;
            self.sample_clock += elapsed;
            self.frame_clock += elapsed;

            if self.frame_clock > CPU_CLOCKS_PER_FRAME {
                self.frame_clock -= CPU_CLOCKS_PER_FRAME;
                self.finish_frame();
            }
        }

        self.sample_clock -= self.clocks_per_sample;

        Ok(self.cpu.bus().apu.sample())
    }

    pub fn fill_samples(&mut self, buffer: &mut [f32]) -> Result<(), CpuError> {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample()?;
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.reset_bus();

        self.file.borrow_mut().reset_banks();

        let chips = self.file.borrow().chips();
        self.cpu.bus_mut().apu = Apu::new(self.file.clone(), chips);

        self.playing = false;
        self.frame_routine_done = false;
        self.sample_clock = 0.;
        self.frame_clock = 0.;
    }

    fn finish_frame(&mut self) {
        if self.cpu.is_halted() {
            self.frame_routine_done = true;
            self.cpu.clear_halted();
        }

        // once the track is initialized, every frame calls the play routine
        if self.frame_routine_done {
            self.cpu.set_pc(PLAY_STUB_ADDRESS);
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SavableDriverState {
    playing: bool,
    now_playing: u8,
    frame_routine_done: bool,
    sample_clock: f64,
    frame_clock: f64,
    bank_select: [u8; 8],
}

impl NSF {
    pub fn save_state<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        let state = SavableDriverState {
            playing: self.playing,
            now_playing: self.now_playing,
            frame_routine_done: self.frame_routine_done,
            sample_clock: self.sample_clock,
            frame_clock: self.frame_clock,
            bank_select: self.file.borrow().bank_select(),
        };

        bincode::serialize_into(&mut writer, &state)
            .map_err(|_| SaveError::SerializationError)?;

        self.cpu.save(&mut writer)?;

        Ok(())
    }

    pub fn load_state<R: Read>(&mut self, mut reader: R) -> Result<(), SaveError> {
        let state: SavableDriverState =
            bincode::deserialize_from(&mut reader).map_err(|err| match *err {
                bincode::ErrorKind::Io(err) => SaveError::IoError(err),
                _ => SaveError::SerializationError,
            })?;

        self.playing = state.playing;
        self.now_playing = state.now_playing;
        self.frame_routine_done = state.frame_routine_done;
        self.sample_clock = state.sample_clock;
        self.frame_clock = state.frame_clock;
        self.file.borrow_mut().set_bank_select(state.bank_select);

        self.cpu.load(&mut reader)?;

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;

        if !rest.is_empty() {
            return Err(SaveError::ContainExtraData);
        }

        Ok(())
    }
}
