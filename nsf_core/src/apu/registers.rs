memory_mapped_registers! {
    pub enum Register {
        Pulse1Control = 0x4000,
        Pulse1Sweep = 0x4001,
        Pulse1TimerLow = 0x4002,
        Pulse1TimerHigh = 0x4003,

        Pulse2Control = 0x4004,
        Pulse2Sweep = 0x4005,
        Pulse2TimerLow = 0x4006,
        Pulse2TimerHigh = 0x4007,

        TriangleLinear = 0x4008,
        TriangleUnused = 0x4009, // unused
        TriangleTimerLow = 0x400A,
        TriangleTimerHigh = 0x400B,

        NoiseControl = 0x400C,
        NoiseUnused = 0x400D, // unused
        NoiseTimerMode = 0x400E,
        NoiseLength = 0x400F,

        DmcFlagsRate = 0x4010,
        DmcDirectLoad = 0x4011,
        DmcSampleAddress = 0x4012,
        DmcSampleLength = 0x4013,

        ChannelsEnable = 0x4015,

        SequencerMode = 0x4017,
    }
}

memory_mapped_registers! {
    pub enum ExpansionRegister {
        Vrc6Pulse1Control = 0x9000,
        Vrc6Pulse1TimerLow = 0x9001,
        Vrc6Pulse1TimerHigh = 0x9002,

        Vrc6Pulse2Control = 0xA000,
        Vrc6Pulse2TimerLow = 0xA001,
        Vrc6Pulse2TimerHigh = 0xA002,

        Vrc6SawtoothRate = 0xB000,
        Vrc6SawtoothTimerLow = 0xB001,
        Vrc6SawtoothTimerHigh = 0xB002,
    }
}
