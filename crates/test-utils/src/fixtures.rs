//! Template literals shared across test suites.
//!
//! The numbered scenarios each isolate one finding; [`ALL`] gathers every
//! fixture for tests that check properties over a whole corpus.

/// An output without `Value`.
pub const MISSING_OUTPUT_VALUE: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Resources:
  MyBucket: {Type: 'AWS::S3::Bucket'}
Outputs:
  BucketName:
    Description: no value here
";

/// `Fn::Equals` with three operands.
pub const EQUALS_ARITY: &str = "\
Conditions:
  Bad: !Equals [a, b, c]
Resources:
  X: {Type: 'AWS::S3::Bucket'}
";

/// A resource guarded by a condition that does not exist.
pub const UNDEFINED_CONDITION: &str = "\
Resources:
  MyBucket:
    Type: 'AWS::S3::Bucket'
    Condition: NonExistent
";

/// One parameter referenced, one not.
pub const UNUSED_PARAMETER: &str = "\
Parameters:
  Used: {Type: String}
  Unused: {Type: String}
Resources:
  MyBucket:
    Type: 'AWS::S3::Bucket'
    Properties: {BucketName: !Ref Used}
";

/// A `NoEcho` parameter exposed through an output.
pub const NO_ECHO_OUTPUT: &str = "\
Parameters:
  Secret: {Type: String, NoEcho: true}
Resources:
  X: {Type: 'AWS::S3::Bucket'}
Outputs:
  Leak: {Value: !Ref Secret}
";

/// A minimal SAM function; `MyFunction:` is on line 4.
pub const SAM_FUNCTION: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Transform: AWS::Serverless-2016-10-31
Resources:
  MyFunction:
    Type: AWS::Serverless::Function
    Properties: {Runtime: python3.9, Handler: i.h, CodeUri: ./s}
";

/// Line of the `MyFunction:` key in [`SAM_FUNCTION`]
pub const SAM_FUNCTION_LINE: u32 = 4;

/// A template using every section that lints clean.
pub const CLEAN: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Description: Queue with an optional alarm topic
Parameters:
  Environment:
    Type: String
    AllowedValues: [dev, prod]
    Default: dev
  RetentionSeconds:
    Type: Number
    Default: 345600
Mappings:
  EnvironmentMap:
    dev: {Suffix: d}
    prod: {Suffix: p}
Conditions:
  IsProd: !Equals [!Ref Environment, prod]
Resources:
  Queue:
    Type: AWS::SQS::Queue
    DeletionPolicy: Retain
    Properties:
      QueueName: !Join ['-', [queue, !FindInMap [EnvironmentMap, !Ref Environment, Suffix]]]
      MessageRetentionPeriod: !Ref RetentionSeconds
  AlarmTopic:
    Type: AWS::SNS::Topic
    Condition: IsProd
    DependsOn: Queue
    Properties:
      TopicName: !Sub '${AWS::StackName}-${Queue.QueueName}-alarms'
Outputs:
  QueueArn:
    Value: !GetAtt Queue.Arn
    Export:
      Name: !Sub '${AWS::StackName}-QueueArn'
  TopicArn:
    Condition: IsProd
    Value: !Ref AlarmTopic
";

/// A template that trips many rules at once.
pub const MESSY: &str = "\
Parameters:
  unused-param: {Type: Strin}
  Pattern: {Type: String, AllowedPattern: '[a-', Default: x}
Conditions:
  Orphan: !Or [!Equals [a, b]]
  Negated: !Not [!Equals [a, b], !Equals [c, d]]
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Condition: Negated
    DeletionPolicy: Keep
    DependsOn: Missing
    Properties:
      BucketName: !Sub plain
      Tags:
        - {Key: k, Value: !Ref Nowhere}
  Topic:
    Type: AWS::SNS::Topic
    Properties:
      TopicName: !GetAtt Bucket.Arn
Outputs:
  Name:
    Value: !Join [',']
    Extra: 1
";

/// Every fixture above, by name
pub const ALL: &[(&str, &str)] = &[
    ("missing_output_value", MISSING_OUTPUT_VALUE),
    ("equals_arity", EQUALS_ARITY),
    ("undefined_condition", UNDEFINED_CONDITION),
    ("unused_parameter", UNUSED_PARAMETER),
    ("no_echo_output", NO_ECHO_OUTPUT),
    ("sam_function", SAM_FUNCTION),
    ("clean", CLEAN),
    ("messy", MESSY),
];
