//! Text Layouts

use sensor_source::SensorSample;

/// First row of every log file
pub const CSV_HEADER: &str = "T [ms],AccX [mg],AccY [mg],AccZ [mg],GyroX [mdps],GyroY [mdps],GyroZ [mdps],MagX [mgauss],MagY [mgauss],MagZ [mgauss],P [mB],T [°C],H [%]\r\n";

/// Name of the `counter`-th log file of this session
pub fn log_file_name(counter: u16) -> String {
    format!("SensorTile_Log_N{:03}.csv", counter)
}

/// One CSV data row, CRLF terminated
pub fn csv_row(s: &SensorSample) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {:5.2}, {:5.2}, {:4.1}\r\n",
        s.timestamp_ms,
        s.acc.x,
        s.acc.y,
        s.acc.z,
        s.gyro.x,
        s.gyro.y,
        s.gyro.z,
        s.mag.x,
        s.mag.y,
        s.mag.z,
        s.pressure,
        s.temperature,
        s.humidity
    )
}

/// Labelled multi-line block for the live stream
pub fn stream_block(s: &SensorSample) -> String {
    format!(
        "TimeStamp: {}\r\n Acc_X: {}, Acc_Y: {}, Acc_Z :{}\r\n Gyro_X:{}, Gyro_Y:{}, Gyro_Z:{}\r\n Magn_X:{}, Magn_Y:{}, Magn_Z:{}\r\n Press:{:5.2}, Temp:{:5.2}, Hum:{:4.1}\r\n",
        s.timestamp_ms,
        s.acc.x,
        s.acc.y,
        s.acc.z,
        s.gyro.x,
        s.gyro.y,
        s.gyro.z,
        s.mag.x,
        s.mag.y,
        s.mag.z,
        s.pressure,
        s.temperature,
        s.humidity
    )
}
